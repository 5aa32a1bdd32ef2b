use crate::core::record::Record;
use crate::store::Session;

/// Which dialog the shell is showing. Visibility itself is the shell's
/// `Option<DialogPage>`; closing always goes through `Message::CloseDialog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPage {
    Add,
    Edit,
    ConfirmDelete,
}

#[derive(Debug, Clone)]
pub enum Message {
    // Startup and session renewal
    IdentityReady(Result<Session, String>),
    /// A store request came back 401; the shell signs in again and reopens
    /// the watch with the fresh credentials.
    SessionExpired,

    // Live snapshot subscription
    ServicesSnapshot(Result<Vec<Record>, String>),

    // Dialog orchestration
    OpenAddDialog,
    OpenEditDialog(String),
    OpenDeleteDialog(String),
    CloseDialog,
    DialogSubmit,
    DeleteConfirmed,

    // Service form fields (indices into the fixed category/status lists)
    FormTitle(usize),
    FormPassport(String),
    FormDescription(String),
    FormDate(String),
    FormStatus(usize),

    // Mutation completions
    InsertCompleted(Result<(), String>),
    PatchCompleted(Result<(), String>),
    DeleteCompleted(Result<(), String>),
}
