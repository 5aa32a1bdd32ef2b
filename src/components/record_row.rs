use chrono::{DateTime, Utc};
use cosmic::iced::{Alignment, Background, Border, Color, Length};
use cosmic::widget::{button, container, icon, row, text};
use cosmic::{Element, theme};

use crate::core::record::{Record, ServiceStatus};
use crate::message::Message;

// Column widths for consistent alignment
const COL_TITLE: f32 = 130.0;
const COL_PASSPORT: f32 = 110.0;
const COL_DATE: f32 = 100.0;
const COL_STATUS: f32 = 110.0;
const COL_CREATOR: f32 = 90.0;
const COL_ACTIONS: f32 = 84.0;

const OVERDUE_TINT: Color = Color::from_rgba(0.85, 0.25, 0.25, 0.12);

fn col(width: f32, content: impl Into<Element<'static, Message>>) -> Element<'static, Message> {
    container(content).width(Length::Fixed(width)).into()
}

fn col_fill(content: impl Into<Element<'static, Message>>) -> Element<'static, Message> {
    container(content).width(Length::Fill).into()
}

/// Fixed status → badge color map. Unrecognized statuses get the neutral
/// gray so foreign records still render.
pub fn badge_color(status: Option<ServiceStatus>) -> Color {
    match status {
        Some(ServiceStatus::Intake) => Color::from_rgb8(0x35, 0x84, 0xe4),
        Some(ServiceStatus::Verified) => Color::from_rgb8(0x91, 0x41, 0xac),
        Some(ServiceStatus::Pending) => Color::from_rgb8(0xc6, 0x8c, 0x00),
        Some(ServiceStatus::FollowUp) => Color::from_rgb8(0xe6, 0x61, 0x00),
        Some(ServiceStatus::Done) => Color::from_rgb8(0x2e, 0xa6, 0x40),
        None => Color::from_rgb8(0x77, 0x76, 0x7b),
    }
}

/// Human label for a record's status: two words for follow-up, otherwise
/// the capitalized keyword (including unknown values from other clients).
pub fn status_label(record: &Record) -> String {
    match record.status() {
        Some(status) => status.label().to_string(),
        None => {
            let mut chars = record.status.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => "—".to_string(),
            }
        }
    }
}

fn status_badge(record: &Record) -> Element<'static, Message> {
    let color = badge_color(record.status());
    container(text::caption(status_label(record)).class(theme::Text::Color(Color::WHITE)))
        .padding([2, 10])
        .class(theme::Container::custom(move |_theme| {
            cosmic::iced::widget::container::Style {
                background: Some(Background::Color(color)),
                border: Border {
                    radius: 12.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        }))
        .into()
}

pub fn table_header() -> Element<'static, Message> {
    row()
        .spacing(8)
        .push(col(COL_TITLE, text::caption("Service")))
        .push(col(COL_PASSPORT, text::caption("Passport")))
        .push(col_fill(text::caption("Description")))
        .push(col(COL_DATE, text::caption("Date")))
        .push(col(COL_STATUS, text::caption("Status")))
        .push(col(COL_CREATOR, text::caption("Entered By")))
        .push(col(COL_ACTIONS, text::caption("")))
        .into()
}

/// One table row. The overdue tint is derived from the wall clock on every
/// render, so it can flip without any data change.
pub fn record_row(record: &Record, now: DateTime<Utc>) -> Element<'static, Message> {
    let overdue = record.is_overdue(now);

    let passport = record.passport_number.clone().unwrap_or_else(|| "—".to_string());
    let date = record
        .date_entered
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "—".to_string());
    let creator = if record.created_by.is_empty() {
        "—".to_string()
    } else {
        let mut short: String = record.created_by.chars().take(8).collect();
        if record.created_by.chars().count() > 8 {
            short.push('…');
        }
        short
    };

    let actions = row()
        .spacing(4)
        .push(
            button::icon(icon::from_name("document-edit-symbolic"))
                .on_press(Message::OpenEditDialog(record.id.clone())),
        )
        .push(
            button::icon(icon::from_name("edit-delete-symbolic"))
                .on_press(Message::OpenDeleteDialog(record.id.clone())),
        );

    let cells = row()
        .spacing(8)
        .align_y(Alignment::Center)
        .push(col(COL_TITLE, text::body(record.title.clone())))
        .push(col(COL_PASSPORT, text::caption(passport)))
        .push(col_fill(text::body(record.description.clone())))
        .push(col(COL_DATE, text::caption(date)))
        .push(col(COL_STATUS, status_badge(record)))
        .push(col(COL_CREATOR, text::caption(creator)))
        .push(col(COL_ACTIONS, actions));

    let body = container(cells).padding([6, 8]).width(Length::Fill);

    if overdue {
        body.class(theme::Container::custom(|_theme| {
            cosmic::iced::widget::container::Style {
                background: Some(Background::Color(OVERDUE_TINT)),
                border: Border {
                    radius: 8.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        }))
        .into()
    } else {
        body.into()
    }
}
