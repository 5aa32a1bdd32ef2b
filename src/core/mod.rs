pub mod form;
pub mod record;
pub mod summary;
