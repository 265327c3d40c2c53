//! Email template rendering engine.
//!
//! Handlebars templates for the two messages the backend sends.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{EmailConfirmationData, OrderReceipt};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Subject of the registration / email-change confirmation message.
pub const EMAIL_CONFIRMATION_SUBJECT: &str = "Registration on retail site";

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// HTML body content.
    pub html: String,
    /// Plain text body content.
    pub text: String,
    /// Email subject line.
    pub subject: String,
}

/// Template engine for rendering email templates.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        for (name, source) in [
            ("email_confirmation_html", EMAIL_CONFIRMATION_HTML_TEMPLATE),
            ("email_confirmation_text", EMAIL_CONFIRMATION_TEXT_TEMPLATE),
            ("order_receipt_html", ORDER_RECEIPT_HTML_TEMPLATE),
            ("order_receipt_text", ORDER_RECEIPT_TEXT_TEMPLATE),
        ] {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| NotificationError::Template(format!("Failed to register {}: {}", name, e)))?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    fn render<T: Serialize>(&self, template_name: &str, data: &T) -> NotificationResult<String> {
        Ok(self.handlebars.render(template_name, data)?)
    }

    /// Render the confirmation-link email.
    pub fn render_email_confirmation(
        &self,
        data: &EmailConfirmationData,
    ) -> NotificationResult<RenderedEmail> {
        debug!(to = %data.email, "Rendering email confirmation");

        Ok(RenderedEmail {
            html: self.render("email_confirmation_html", data)?,
            text: self.render("email_confirmation_text", data)?,
            subject: EMAIL_CONFIRMATION_SUBJECT.to_string(),
        })
    }

    /// Render an order receipt.
    pub fn render_order_receipt(&self, receipt: &OrderReceipt) -> NotificationResult<RenderedEmail> {
        debug!(order_id = receipt.order_id, lines = receipt.lines.len(), "Rendering order receipt");

        Ok(RenderedEmail {
            html: self.render("order_receipt_html", receipt)?,
            text: self.render("order_receipt_text", receipt)?,
            subject: format!("Order #{} confirmed", receipt.order_id),
        })
    }
}

const EMAIL_CONFIRMATION_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Confirm your email</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 40px;">
        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">
          Confirm your email address
        </h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          Follow the link below to activate the account registered for {{email}}.
        </p>
        <p style="text-align: center;">
          <a href="{{confirmation_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; font-size: 16px; padding: 12px 32px; text-decoration: none; border-radius: 6px;">
            Confirm email
          </a>
        </p>
        <p style="color: #71717a; font-size: 12px; text-align: center; margin: 24px 0 0 0;">
          If you didn't create an account, you can safely ignore this email.
        </p>
      </td>
    </tr>
  </table>
</body>
</html>"#;

// Plain-text bodies use triple braces so values are not HTML-escaped.
const EMAIL_CONFIRMATION_TEXT_TEMPLATE: &str = r#"Confirm your email address

Follow the link below to activate the account registered for {{{email}}}:

{{{confirmation_url}}}

If you didn't create an account, you can safely ignore this email.
"#;

const ORDER_RECEIPT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Order #{{order_id}}</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 40px;">
        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0;">
          Order #{{order_id}} confirmed
        </h1>
        <p style="color: #52525b; font-size: 14px;">Buyer: {{buyer_email}}</p>
        <table width="100%" cellspacing="0" cellpadding="6" style="border-collapse: collapse; font-size: 14px; color: #18181b;">
          <tr style="border-bottom: 1px solid #e4e4e7; text-align: left;">
            <th>Product</th><th>Shop</th><th>Qty</th><th>Price</th><th>Total</th>
          </tr>
          {{#each lines}}
          <tr style="border-bottom: 1px solid #f4f4f5;">
            <td>{{product}}</td><td>{{shop}}</td><td>{{quantity}}</td><td>{{price}}</td><td>{{total_price}}</td>
          </tr>
          {{/each}}
        </table>
        <p style="color: #18181b; font-size: 16px; font-weight: 600; text-align: right; margin: 16px 0 0 0;">
          Order total: {{total_sum}}
        </p>
      </td>
    </tr>
  </table>
</body>
</html>"#;

const ORDER_RECEIPT_TEXT_TEMPLATE: &str = r#"Order #{{order_id}} confirmed

Buyer: {{{buyer_email}}}

{{#each lines}}
- {{{product}}} ({{{shop}}}): {{quantity}} x {{price}} = {{total_price}}
{{/each}}

Order total: {{total_sum}}
"#;
