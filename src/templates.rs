//! Rendering of notification content.
//!
//! One renderer covers every meeting action; subject prefix, headline,
//! accent color and intro line vary per action. Structured fields only —
//! the wire format belongs to the sink.

use chrono::{DateTime, Timelike, Utc};

use crate::models::meeting::Meeting;
use crate::models::notification::{NotificationAction, RenderedMessage};

/// Escapes HTML metacharacters in interpolated values.
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Formats an instant the way the original UI did: dd/mm/yyyy h:MM AM/PM.
pub fn format_date_to_ui(instant: DateTime<Utc>) -> String {
    // %-l is not portable; build the 12-hour clock by hand
    let hour24 = instant.hour();
    let ampm = if hour24 >= 12 { "PM" } else { "AM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!(
        "{} {}:{:02} {}",
        instant.format("%d/%m/%Y"),
        hour12,
        instant.minute(),
        ampm
    )
}

struct ActionStyle {
    subject_prefix: &'static str,
    headline: &'static str,
    accent_color: &'static str,
    cta_text: &'static str,
}

fn action_style(action: NotificationAction) -> ActionStyle {
    match action {
        NotificationAction::Created => ActionStyle {
            subject_prefix: "Meeting Scheduled",
            headline: "Meeting Scheduled",
            accent_color: "#0b78e3",
            cta_text: "View Meeting",
        },
        NotificationAction::Pending => ActionStyle {
            subject_prefix: "Meeting Approval Required",
            headline: "Meeting Approval Required",
            accent_color: "#8b5cf6",
            cta_text: "Review Meeting",
        },
        NotificationAction::Updated => ActionStyle {
            subject_prefix: "Meeting Updated",
            headline: "Meeting Updated",
            accent_color: "#f59e0b",
            cta_text: "View Meeting",
        },
        NotificationAction::Removed => ActionStyle {
            subject_prefix: "Meeting Invitation Withdrawn",
            headline: "Meeting Invitation Withdrawn",
            accent_color: "#ef4444",
            cta_text: "View Details",
        },
        NotificationAction::Cancelled => ActionStyle {
            subject_prefix: "Meeting Cancelled",
            headline: "Meeting Cancelled",
            accent_color: "#ef4444",
            cta_text: "View Details",
        },
        NotificationAction::Reminder => ActionStyle {
            subject_prefix: "Meeting Reminder",
            headline: "Meeting Starting Soon",
            accent_color: "#10b981",
            cta_text: "Join Meeting",
        },
    }
}

fn intro_line(action: NotificationAction, organizer_email: &str) -> String {
    match action {
        NotificationAction::Created => format!(
            "You have a new meeting scheduled by {}.",
            organizer_email
        ),
        NotificationAction::Pending => format!(
            "A meeting scheduled by {} is awaiting approval.",
            organizer_email
        ),
        NotificationAction::Updated => format!(
            "The meeting has been updated by {}. Please review the new details.",
            organizer_email
        ),
        NotificationAction::Removed => format!(
            "You have been removed from a meeting scheduled by {}.",
            organizer_email
        ),
        NotificationAction::Cancelled => format!(
            "The meeting scheduled by {} has been cancelled.",
            organizer_email
        ),
        NotificationAction::Reminder => {
            "Your meeting starts in a few minutes.".to_string()
        }
    }
}

/// Builds the subject, plain-text and HTML bodies for a meeting
/// notification.
pub fn build_meeting_message(
    meeting: &Meeting,
    room_name: &str,
    organizer_email: &str,
    action: NotificationAction,
    app_url: &str,
) -> RenderedMessage {
    let style = action_style(action);
    let intro = intro_line(action, organizer_email);

    let start_label = format_date_to_ui(meeting.start_time);
    let end_label = format_date_to_ui(meeting.end_time);
    let attendees_count = meeting.candidate_ids.len();
    let details = if meeting.reason.is_empty() {
        "No additional details provided."
    } else {
        meeting.reason.as_str()
    };

    let subject = format!("{}: {} — {}", style.subject_prefix, room_name, start_label);

    let base = app_url.trim_end_matches('/');
    let meeting_url = format!("{}/meetings/{}", base, meeting.id);

    let html = format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
</head>
<body style="font-family: Arial, Helvetica, sans-serif; color:#222; margin:0; padding:0;">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0">
    <tr>
      <td style="padding:20px; background:#f7f7f7;">
        <table role="presentation" width="600" align="center" cellpadding="0" cellspacing="0" style="background:#ffffff; border-radius:8px; overflow:hidden;">
          <tr>
            <td style="padding:24px 28px; border-bottom:1px solid #eee;">
              <h2 style="margin:0; font-size:20px; color:{accent};">{headline}</h2>
              <p style="margin:6px 0 0; color:#555;">{intro}</p>
            </td>
          </tr>
          <tr>
            <td style="padding:18px 28px;">
              <table role="presentation" width="100%" cellpadding="6" cellspacing="0">
                <tr>
                  <td style="width:150px; font-weight:600; color:#333;">When</td>
                  <td style="color:#555;">{start} — {end}</td>
                </tr>
                <tr>
                  <td style="font-weight:600; color:#333;">Where</td>
                  <td style="color:#555;">{room}</td>
                </tr>
                <tr>
                  <td style="font-weight:600; color:#333;">Organizer</td>
                  <td style="color:#555;">{organizer}</td>
                </tr>
                <tr>
                  <td style="font-weight:600; color:#333;">Attendees</td>
                  <td style="color:#555;">{attendees}</td>
                </tr>
              </table>
              <div style="margin:18px 0;">
                <p style="color:#333; margin:0 0 12px;">Details:</p>
                <div style="padding:12px; background:#f4f6fb; border-radius:6px; color:#444;">{details}</div>
              </div>
              <div style="text-align:center; margin-top:18px;">
                <a href="{url}" style="display:inline-block; text-decoration:none; background:{accent}; color:#fff; padding:10px 18px; border-radius:6px;">{cta}</a>
              </div>
            </td>
          </tr>
          <tr>
            <td style="padding:14px 28px; border-top:1px solid #eee; font-size:12px; color:#777;">
              <p style="margin:0;">If you can't attend, please contact {organizer} or update your RSVP in the app.</p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        accent = escape_html(style.accent_color),
        headline = escape_html(style.headline),
        intro = escape_html(&intro),
        start = escape_html(&start_label),
        end = escape_html(&end_label),
        room = escape_html(room_name),
        organizer = escape_html(organizer_email),
        attendees = attendees_count,
        details = escape_html(details),
        url = meeting_url,
        cta = escape_html(style.cta_text),
    );

    let text = [
        format!("{} — {}", meeting.reason, style.subject_prefix),
        String::new(),
        format!("When: {} — {}", start_label, end_label),
        format!("Where: {}", room_name),
        format!("Organizer: {}", organizer_email),
        format!("Attendees: {}", attendees_count),
        String::new(),
        "Details:".to_string(),
        details.to_string(),
        String::new(),
        format!("{}: {}", style.cta_text, meeting_url),
    ]
    .join("\n");

    RenderedMessage {
        subject,
        text,
        html,
    }
}
