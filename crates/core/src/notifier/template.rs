//! Email content for delivery notifications.

use super::NotificationPayload;

pub fn video_ready_subject() -> String {
    "Your video is ready".to_string()
}

pub fn video_ready_html(payload: &NotificationPayload) -> String {
    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Your video is ready!</h2>
  <p>The video you ordered has finished generating.</p>
  <p><a href="{url}" style="display: inline-block; padding: 12px 24px; background: #4f46e5; color: #fff; text-decoration: none; border-radius: 6px;">Watch your video</a></p>
  <p style="color: #666; font-size: 14px;">Prompt: {prompt}</p>
  <p style="color: #666; font-size: 14px;">{resolution}p &middot; {duration}s</p>
  <p style="color: #999; font-size: 12px;">If the button does not work, copy this link: {url}</p>
</div>"#,
        url = payload.video_url,
        prompt = html_escape(&payload.prompt),
        resolution = payload.resolution,
        duration = payload.duration_secs,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
