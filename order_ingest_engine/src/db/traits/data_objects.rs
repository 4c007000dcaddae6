#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted,
    AlreadyExists,
}

