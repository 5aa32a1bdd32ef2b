use chrono::Utc;
use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, flex_row, horizontal_space, row, scrollable, text};
use cosmic::Element;

use crate::components::record_row::{record_row, table_header};
use crate::components::status_card::status_card;
use crate::core::record::{Record, ServiceStatus};
use crate::core::summary::StatusSummary;
use crate::message::Message;

/// The single dashboard page: per-status count cards, the record table and
/// a footer naming the signed-in identity.
pub fn dashboard_view(
    records: &[Record],
    summary: &StatusSummary,
    loading: bool,
    store_ready: bool,
    identity: Option<&str>,
) -> Element<'static, Message> {
    let now = Utc::now();
    let mut content = column().spacing(16);

    let cards: Vec<Element<'static, Message>> = ServiceStatus::ALL
        .iter()
        .map(|status| status_card(*status, summary.count(*status)))
        .collect();
    content = content.push(flex_row(cards).row_spacing(12).column_spacing(12));

    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::title4("Service Requests"))
            .push(horizontal_space())
            .push(button::suggested("New Service").on_press(Message::OpenAddDialog)),
    );

    if !store_ready {
        content = content.push(
            container(text::body(
                "Store is not configured. Set VISADESK_PROJECT_ID and VISADESK_API_KEY and restart.",
            ))
            .padding(32)
            .center_x(Length::Fill)
            .width(Length::Fill),
        );
    } else if loading {
        content = content.push(
            container(text::body("Loading services…"))
                .padding(32)
                .center_x(Length::Fill)
                .width(Length::Fill),
        );
    } else if records.is_empty() {
        content = content.push(
            container(text::body("No service requests yet."))
                .padding(32)
                .center_x(Length::Fill)
                .width(Length::Fill),
        );
    } else {
        let mut table = column().spacing(2).push(table_header());
        for record in records {
            table = table.push(record_row(record, now));
        }
        content = content.push(table);
    }

    let footer = match identity {
        Some(uid) => text::caption(format!("Signed in as {}", uid)),
        None => text::caption("Not signed in".to_string()),
    };
    content = content.push(footer);

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
