pub fn render_welcome(name: &str, base_url: &str) -> String {
    let name = escape(name);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Welcome to Workhub</h2>
    <p>Hi {name},</p>
    <p>Your account has been created. You can log in at:</p>
    <p><a href="{base_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Log In</a></p>
    <p style="color: #666; font-size: 14px;">If you didn't expect this email, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_notification(name: &str, title: &str, message: &str, link: Option<&str>) -> String {
    let name = escape(name);
    let title = escape(title);
    let message = escape(message);
    let button = link
        .map(|url| {
            format!(
                r#"<p><a href="{}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Open</a></p>"#,
                escape(url)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{title}</h2>
    <p>Hi {name},</p>
    <p>{message}</p>
    {button}
</body>
</html>"#
    )
}

/// Project titles and feedback are user supplied.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_escapes_user_content() {
        let html = render_notification("Ann", "Work <b>rejected</b>", "needs \"rework\"", None);
        assert!(html.contains("Work &lt;b&gt;rejected&lt;/b&gt;"));
        assert!(html.contains("needs &quot;rework&quot;"));
        assert!(!html.contains("Open</a>"));
    }

    #[test]
    fn notification_links_when_url_given() {
        let html = render_notification("Ann", "Done", "ok", Some("https://hub.dev/projects/1"));
        assert!(html.contains(r#"href="https://hub.dev/projects/1""#));
    }
}
