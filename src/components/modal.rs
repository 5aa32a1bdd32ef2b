use cosmic::iced::Color;
use cosmic::widget::{self, button, column, text};
use cosmic::{Element, theme};

use crate::message::Message;

const ERROR_RED: Color = Color::from_rgb(0.85, 0.25, 0.25);

/// Shared scaffold for the add/edit/delete dialogs: a title, a content
/// slot, a primary action and a Cancel action. Cancel and Escape route
/// through the same `CloseDialog` path as a successful submit, so exactly
/// one code path resets visibility.
pub fn modal<'a>(
    title: &'a str,
    content: Element<'a, Message>,
    error: Option<&'a str>,
    primary: button::Button<'a, Message>,
) -> Element<'a, Message> {
    let mut body = column().spacing(12).push(content);
    if let Some(error) = error {
        body = body.push(text::body(error.to_string()).class(theme::Text::Color(ERROR_RED)));
    }

    widget::dialog()
        .title(title)
        .control(body)
        .primary_action(primary)
        .secondary_action(button::standard("Cancel").on_press(Message::CloseDialog))
        .into()
}
