use cosmic::app::{Core, Task as CosmicTask};
use cosmic::iced::{Length, Subscription};
use cosmic::widget::{button, column, dropdown, text, text_input};
use cosmic::{Application, Element, executor};

use crate::components::modal::modal;
use crate::config::AppConfig;
use crate::core::form::ServiceForm;
use crate::core::record::{Record, ServiceCategory, ServiceStatus};
use crate::core::summary::StatusSummary;
use crate::message::{DialogPage, Message};
use crate::pages;
use crate::store::firestore::{self, StoreClient};
use crate::store::{Session, StoreError, auth};

pub struct VisaDesk {
    core: Core,
    config: AppConfig,

    // Identity & store connection
    session: Option<Session>,
    store: Option<StoreClient>,
    /// Bumped whenever the store client is replaced; keys the watch
    /// subscription so the old stream is torn down and a fresh one opened.
    store_generation: u64,
    /// A renewal task is in flight; further 401s are ignored until it lands.
    renewing: bool,

    // Data (replaced wholesale by each snapshot)
    records: Vec<Record>,
    summary: StatusSummary,
    loading: bool,

    // Dialog state
    dialog: Option<DialogPage>,
    form: ServiceForm,
    /// The record targeted by the edit/delete dialog.
    current_service: Option<Record>,
    dialog_error: Option<String>,
}

pub struct Flags {
    pub config: AppConfig,
}

impl Application for VisaDesk {
    type Executor = executor::Default;
    type Flags = Flags;
    type Message = Message;

    const APP_ID: &'static str = "dev.visadesk.app";

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, CosmicTask<Self::Message>) {
        let config = flags.config;
        let store_ready = config.store_ready();

        let app = Self {
            core,
            config: config.clone(),
            session: None,
            store: None,
            store_generation: 0,
            renewing: false,
            records: Vec::new(),
            summary: StatusSummary::default(),
            loading: store_ready,
            dialog: None,
            form: ServiceForm::default(),
            current_service: None,
            dialog_error: None,
        };

        let task = if store_ready {
            CosmicTask::perform(
                async move {
                    auth::ensure_identity(&config)
                        .await
                        .map_err(|e| e.to_string())
                },
                |result| cosmic::Action::App(Message::IdentityReady(result)),
            )
        } else {
            log::error!("Store is not configured; the dashboard will stay empty");
            CosmicTask::none()
        };

        (app, task)
    }

    fn update(&mut self, message: Message) -> CosmicTask<Message> {
        match message {
            Message::IdentityReady(Ok(session)) => {
                self.renewing = false;
                log::info!("Signed in as {}", session.uid);
                match StoreClient::new(&self.config, &session) {
                    Ok(client) => {
                        self.store = Some(client);
                        // Opens (or reopens, after a renewal) the watch
                        // subscription with the fresh credentials.
                        self.store_generation += 1;
                    }
                    Err(e) => {
                        log::error!("Failed to build store client: {}", e);
                        self.loading = false;
                    }
                }
                self.session = Some(session);
            }

            Message::IdentityReady(Err(e)) => {
                // Degrade to a read-only shell instead of blocking the UI.
                self.renewing = false;
                log::error!("Sign-in failed: {}", e);
                self.loading = false;
                if self.dialog.is_some() {
                    self.dialog_error = Some(format!("Sign-in failed: {}", e));
                }
            }

            Message::SessionExpired => {
                if self.renewing {
                    return CosmicTask::none();
                }
                log::warn!("Store credentials expired, renewing the session");
                self.renewing = true;
                // Dropping the client stops the watch stream until the new
                // sign-in completes.
                self.store = None;
                if self.dialog.is_some() {
                    self.dialog_error = Some("Session expired, please retry".to_string());
                }
                let config = self.config.clone();
                let previous = self.session.clone();
                return CosmicTask::perform(
                    async move {
                        let renewed = match &previous {
                            Some(previous) => auth::renew_identity(&config, previous).await,
                            None => auth::ensure_identity(&config).await,
                        };
                        renewed.map_err(|e| e.to_string())
                    },
                    |result| cosmic::Action::App(Message::IdentityReady(result)),
                );
            }

            Message::ServicesSnapshot(Ok(records)) => {
                self.loading = false;
                self.summary = StatusSummary::from_records(&records);
                self.records = records;
            }

            Message::ServicesSnapshot(Err(e)) => {
                // Keep the last known list; just stop the spinner.
                log::error!("Snapshot failed: {}", e);
                self.loading = false;
            }

            Message::OpenAddDialog => {
                self.form = ServiceForm::default();
                self.dialog = Some(DialogPage::Add);
                self.dialog_error = None;
            }

            Message::OpenEditDialog(ref id) => {
                if let Some(record) = self.records.iter().find(|r| r.id == *id) {
                    self.form = ServiceForm::from_record(record);
                    self.current_service = Some(record.clone());
                    self.dialog = Some(DialogPage::Edit);
                    self.dialog_error = None;
                }
            }

            Message::OpenDeleteDialog(ref id) => {
                if let Some(record) = self.records.iter().find(|r| r.id == *id) {
                    self.current_service = Some(record.clone());
                    self.dialog = Some(DialogPage::ConfirmDelete);
                    self.dialog_error = None;
                }
            }

            Message::CloseDialog => {
                self.close_dialog();
            }

            Message::FormTitle(idx) => {
                if let Some(category) = ServiceCategory::ALL.get(idx) {
                    self.form.title = category.as_keyword().to_string();
                }
            }

            Message::FormPassport(value) => {
                self.form.passport_number = value;
            }

            Message::FormDescription(value) => {
                self.form.description = value;
            }

            Message::FormDate(value) => {
                self.form.date_entered = value;
            }

            Message::FormStatus(idx) => {
                if let Some(status) = ServiceStatus::ALL.get(idx) {
                    self.form.status = status.as_keyword().to_string();
                }
            }

            Message::DialogSubmit => {
                return self.submit_dialog();
            }

            Message::DeleteConfirmed => {
                return self.delete_current();
            }

            Message::InsertCompleted(result)
            | Message::PatchCompleted(result)
            | Message::DeleteCompleted(result) => {
                match result {
                    // The list catches up through the live snapshot; no
                    // optimistic local update.
                    Ok(()) => self.close_dialog(),
                    Err(e) => {
                        log::error!("Mutation failed: {}", e);
                        self.dialog_error = Some(e);
                    }
                }
            }
        }

        CosmicTask::none()
    }

    fn dialog(&self) -> Option<Element<'_, Message>> {
        let dialog = self.dialog?;
        let error = self.dialog_error.as_deref();

        Some(match dialog {
            DialogPage::Add => modal(
                "New Service",
                self.form_view(),
                error,
                button::suggested("Create").on_press(Message::DialogSubmit),
            ),
            DialogPage::Edit => modal(
                "Edit Service",
                self.form_view(),
                error,
                button::suggested("Save").on_press(Message::DialogSubmit),
            ),
            DialogPage::ConfirmDelete => {
                let summary = self
                    .current_service
                    .as_ref()
                    .map(|r| format!("Permanently delete \"{}\" — {}?", r.title, r.description))
                    .unwrap_or_else(|| "Permanently delete this record?".to_string());
                modal(
                    "Delete Service",
                    text::body(summary).into(),
                    error,
                    button::destructive("Delete").on_press(Message::DeleteConfirmed),
                )
            }
        })
    }

    fn on_escape(&mut self) -> CosmicTask<Message> {
        if self.dialog.is_some() {
            self.close_dialog();
        }
        CosmicTask::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![cosmic::iced::event::listen_with(|event, _status, _id| {
            match event {
                cosmic::iced::Event::Keyboard(cosmic::iced::keyboard::Event::KeyPressed {
                    key: cosmic::iced::keyboard::Key::Character(ref c),
                    modifiers,
                    ..
                }) if c.as_str() == "n" && modifiers.control() => Some(Message::OpenAddDialog),
                _ => None,
            }
        })];

        // The watch stream exists only while a store connection does;
        // replacing the client changes the id, which drops the old stream
        // and opens a new one.
        if let Some(client) = &self.store {
            subscriptions.push(
                Subscription::run_with_id(
                    ("services-watch", self.store_generation),
                    firestore::watch(client.clone(), firestore::POLL_INTERVAL),
                )
                .map(snapshot_message),
            );
        }

        Subscription::batch(subscriptions)
    }

    fn header_center(&self) -> Vec<Element<'_, Message>> {
        vec![text::title4("Immigration Services").into()]
    }

    fn view(&self) -> Element<'_, Message> {
        pages::dashboard::dashboard_view(
            &self.records,
            &self.summary,
            self.loading,
            self.config.store_ready(),
            self.session.as_ref().map(|s| s.uid.as_str()),
        )
    }
}

impl VisaDesk {
    /// The one path that resets dialog visibility, used by cancel, escape
    /// and successful submits alike.
    fn close_dialog(&mut self) {
        self.dialog = None;
        self.current_service = None;
        self.dialog_error = None;
    }

    fn form_view(&self) -> Element<'_, Message> {
        let form = &self.form;
        let mut content = column().spacing(12);

        content = content.push(text::title4("Service"));
        let category_labels: Vec<String> = ServiceCategory::ALL
            .iter()
            .map(|c| c.as_keyword().to_string())
            .collect();
        let category_selected = ServiceCategory::from_keyword(&form.title)
            .and_then(|current| ServiceCategory::ALL.iter().position(|c| *c == current));
        content = content.push(dropdown(category_labels, category_selected, Message::FormTitle));

        // Hidden rather than cleared for exempt categories, so toggling the
        // title back does not lose an entered number.
        if form.shows_passport() {
            content = content.push(text::title4("Passport Number"));
            content = content.push(
                text_input::text_input("A1234567", &form.passport_number)
                    .on_input(Message::FormPassport)
                    .width(Length::Fill),
            );
        }

        content = content.push(text::title4("Description"));
        content = content.push(
            text_input::text_input("What is being requested...", &form.description)
                .on_input(Message::FormDescription)
                .on_submit(|_| Message::DialogSubmit)
                .width(Length::Fill),
        );

        content = content.push(text::title4("Date Entered"));
        content = content.push(
            text_input::text_input("YYYY-MM-DD", &form.date_entered)
                .on_input(Message::FormDate)
                .width(Length::Fill),
        );

        content = content.push(text::title4("Status"));
        let status_labels: Vec<String> = ServiceStatus::ALL
            .iter()
            .map(|s| s.label().to_string())
            .collect();
        let status_selected = ServiceStatus::from_keyword(&form.status)
            .and_then(|current| ServiceStatus::ALL.iter().position(|s| *s == current));
        content = content.push(dropdown(status_labels, status_selected, Message::FormStatus));

        content.into()
    }

    fn submit_dialog(&mut self) -> CosmicTask<Message> {
        let draft = match self.form.validate() {
            Ok(draft) => draft,
            Err(e) => {
                log::error!("Validation failed: {}", e);
                self.dialog_error = Some(e);
                return CosmicTask::none();
            }
        };

        // No connection: log and keep the dialog open, never throw.
        let Some(store) = self.store.clone() else {
            log::error!("No store connection; dropping write");
            self.dialog_error = Some("Not connected to the store".to_string());
            return CosmicTask::none();
        };

        match self.dialog {
            Some(DialogPage::Add) => {
                let created_by = self
                    .session
                    .as_ref()
                    .map(|s| s.uid.clone())
                    .unwrap_or_default();
                CosmicTask::perform(
                    async move { store.insert(&draft, &created_by).await },
                    |result| cosmic::Action::App(completion_message(result, Message::InsertCompleted)),
                )
            }
            Some(DialogPage::Edit) => {
                let Some(current) = self.current_service.clone() else {
                    return CosmicTask::none();
                };
                let changed = draft.changed_fields(&current);
                if changed.is_empty() {
                    self.close_dialog();
                    return CosmicTask::none();
                }
                CosmicTask::perform(
                    async move { store.patch(&current.id, &changed, &draft).await },
                    |result| cosmic::Action::App(completion_message(result, Message::PatchCompleted)),
                )
            }
            _ => CosmicTask::none(),
        }
    }

    fn delete_current(&mut self) -> CosmicTask<Message> {
        let Some(store) = self.store.clone() else {
            log::error!("No store connection; dropping delete");
            self.dialog_error = Some("Not connected to the store".to_string());
            return CosmicTask::none();
        };
        let Some(current) = self.current_service.clone() else {
            return CosmicTask::none();
        };

        CosmicTask::perform(
            async move { store.remove(&current.id).await },
            |result| cosmic::Action::App(completion_message(result, Message::DeleteCompleted)),
        )
    }
}

/// Expired credentials surface as a renewal request instead of an error
/// string, so the shell signs in again and resumes rather than failing
/// every request until restart.
fn snapshot_message(result: Result<Vec<Record>, StoreError>) -> Message {
    match result {
        Err(e) if e.is_unauthorized() => Message::SessionExpired,
        other => Message::ServicesSnapshot(other.map_err(|e| e.to_string())),
    }
}

fn completion_message(
    result: Result<(), StoreError>,
    completed: fn(Result<(), String>) -> Message,
) -> Message {
    match result {
        Err(e) if e.is_unauthorized() => Message::SessionExpired,
        other => completed(other.map_err(|e| e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn unauthorized() -> StoreError {
        StoreError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        }
    }

    #[test]
    fn expired_snapshot_requests_renewal() {
        assert!(matches!(
            snapshot_message(Err(unauthorized())),
            Message::SessionExpired
        ));
    }

    #[test]
    fn other_snapshot_errors_pass_through() {
        let msg = snapshot_message(Err(StoreError::Malformed("bad".to_string())));
        assert!(matches!(msg, Message::ServicesSnapshot(Err(_))));
    }

    #[test]
    fn successful_snapshot_passes_through() {
        let msg = snapshot_message(Ok(Vec::new()));
        assert!(matches!(msg, Message::ServicesSnapshot(Ok(records)) if records.is_empty()));
    }

    #[test]
    fn expired_mutation_requests_renewal() {
        assert!(matches!(
            completion_message(Err(unauthorized()), Message::PatchCompleted),
            Message::SessionExpired
        ));
    }

    #[test]
    fn completed_mutation_passes_through() {
        assert!(matches!(
            completion_message(Ok(()), Message::InsertCompleted),
            Message::InsertCompleted(Ok(()))
        ));
    }
}
