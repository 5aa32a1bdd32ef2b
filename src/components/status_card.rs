use cosmic::iced::{Alignment, Length};
use cosmic::widget::{column, container, text};
use cosmic::{Element, theme};

use super::record_row::badge_color;
use crate::core::record::ServiceStatus;
use crate::message::Message;

const CARD_WIDTH: f32 = 130.0;

/// One per-status count card in the dashboard header.
pub fn status_card(status: ServiceStatus, count: usize) -> Element<'static, Message> {
    let content = column()
        .spacing(4)
        .align_x(Alignment::Center)
        .push(text::title4(count.to_string()))
        .push(text::caption(status.label()).class(theme::Text::Color(badge_color(Some(status)))));

    container(content)
        .padding(12)
        .width(Length::Fixed(CARD_WIDTH))
        .center_x(Length::Fixed(CARD_WIDTH))
        .class(theme::Container::Card)
        .into()
}
