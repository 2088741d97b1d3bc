//! Brokerage export parsing.

mod positions_csv;

pub use positions_csv::{
    parse_positions_csv, AccountMetadata, ImportError, PositionRow, PositionsPayload, RowType,
    EXPECTED_HEADER,
};
