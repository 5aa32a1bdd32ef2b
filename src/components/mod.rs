pub mod modal;
pub mod record_row;
pub mod status_card;
