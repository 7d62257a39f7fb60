pub mod cursor;
pub mod entry;
pub mod summary;

pub use cursor::Cursor;
pub use entry::{EntryBody, RawEntry, RawEntryRow};
pub use summary::{NewSummary, Sentiment, Summary, SummaryPayload, SummaryRow};
