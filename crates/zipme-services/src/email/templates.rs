//! Transactional email templates.

/// Every email the application sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Delivery email to the recipient once the sender verified.
    SendFile { sender_email: String, url: String },
    /// Verification email to the sender right after upload.
    VerifyEmail { verify_url: String },
}

/// Plain text and HTML bodies of one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub text: String,
    pub html: String,
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn html_layout(title: &str, paragraphs: &[String], button_label: &str, url: &str, footer: &str) -> String {
    let url = escape_html(url);
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p style=\"margin:0 0 16px;color:#4a4a4a;font-size:14px;line-height:22px\">{}</p>", p))
        .collect();

    format!(
        "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title></head>\
<body style=\"background:#f5f5f5;font-family:sans-serif;margin:0;padding:30px 0\">\
<div style=\"max-width:600px;margin:0 auto;background:#ffffff;border-radius:5px;padding:40px\">\
<h1 style=\"margin:0 0 24px;text-align:center;font-size:28px;color:#1a1a1a\">{title}</h1>\
{body}\
<p style=\"text-align:center;margin:24px 0\"><a href=\"{url}\" style=\"background:#1a1a1a;color:#ffffff;padding:14px 32px;border-radius:6px;text-decoration:none;font-weight:600\">{button_label}</a></p>\
<p style=\"margin:0 0 8px;text-align:center;color:#6b6b6b;font-size:14px\">If the button does not work, copy and paste this link into your browser:</p>\
<p style=\"margin:0 0 24px;text-align:center;font-family:monospace;font-size:13px;word-break:break-all;color:#1a1a1a\">{url}</p>\
<hr style=\"border:none;border-top:1px solid #e5e5e5\">\
<p style=\"text-align:center;color:#6b6b6b;font-size:14px\"><strong>ZipMe</strong> - Secure file sharing</p>\
<p style=\"text-align:center;color:#9b9b9b;font-size:12px\">{footer}</p>\
</div></body></html>"
    )
}

impl EmailTemplate {
    pub fn render(&self) -> RenderedEmail {
        match self {
            EmailTemplate::SendFile { sender_email, url } => {
                let text = format!(
                    "Hello,\n\n\
{sender_email} shared files with you via ZipMe.\n\n\
Open the link below to download the files. It stays valid for 24 hours:\n\n\
{url}\n\n\
Do not share this link with anyone else. If you were not expecting these files, you can ignore this email.\n\n\
ZipMe - Secure file sharing\n"
                );
                let html = html_layout(
                    "ZipMe - Shared files",
                    &[
                        "Hello,".to_string(),
                        format!(
                            "<strong style=\"color:#1a1a1a\">{}</strong> shared files with you via ZipMe.",
                            escape_html(sender_email)
                        ),
                        "Click the button below to download the files. This link stays valid for <strong style=\"color:#1a1a1a\">24 hours</strong>.".to_string(),
                    ],
                    "Download the files",
                    url,
                    "This link expires in 24 hours. Do not share it with anyone else. If you were not expecting these files, you can ignore this email.",
                );
                RenderedEmail { text, html }
            }
            EmailTemplate::VerifyEmail { verify_url } => {
                let text = format!(
                    "Hello,\n\n\
You asked to send files via ZipMe. To complete the transfer, verify your email address by opening the link below. It stays valid for 1 hour:\n\n\
{verify_url}\n\n\
If you did not ask to send files, you can ignore this email.\n\n\
ZipMe - Secure file sharing\n"
                );
                let html = html_layout(
                    "ZipMe - Verification",
                    &[
                        "Hello,".to_string(),
                        "You asked to send files via ZipMe. To complete the transfer, please verify your email address by clicking the button below.".to_string(),
                        "This verification link stays valid for <strong style=\"color:#1a1a1a\">1 hour</strong>.".to_string(),
                    ],
                    "Verify my email",
                    verify_url,
                    "If you did not ask to send files, you can ignore this email.",
                );
                RenderedEmail { text, html }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::SendFile { .. } => "send-file",
            EmailTemplate::VerifyEmail { .. } => "verify-email",
        }
    }
}
