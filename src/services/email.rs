//! Transactional email: SMTP delivery via lettre, HTML bodies from askama
//! templates under `templates/email/`.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::SmtpConfig,
    models::{AddressSnapshot, OrderLineItem},
    money::{format_paise, percent_of, rupees_to_paise},
};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("email delivery is not configured")]
    NotConfigured,
}

#[derive(Template)]
#[template(path = "email/otp.html")]
struct OtpHtml<'a> {
    otp: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/account_created.html")]
struct AccountCreatedHtml<'a> {
    name: &'a str,
}

struct EmailLine {
    name: String,
    quantity: i32,
    amount: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order_id: &'a str,
    lines: Vec<EmailLine>,
    subtotal: String,
    tax: String,
    grand_total: String,
    address: &'a AddressSnapshot,
}

#[derive(Template)]
#[template(path = "email/return_requested.html")]
struct ReturnRequestedHtml<'a> {
    name: &'a str,
    order_id: &'a str,
    return_id: &'a str,
    reason: &'a str,
}

#[derive(Template)]
#[template(path = "email/application_received.html")]
struct ApplicationReceivedHtml<'a> {
    name: &'a str,
    application_id: &'a str,
    job_title: &'a str,
    job_location: &'a str,
}

struct RestockLine {
    name: String,
    price: String,
}

#[derive(Template)]
#[template(path = "email/back_in_stock.html")]
struct BackInStockHtml<'a> {
    name: &'a str,
    products: Vec<RestockLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockedProduct {
    pub id: String,
    pub name: String,
    pub price: i64,
}

/// Emails delivered through the outbox after the state change they describe
/// has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboxMessage {
    AccountCreated {
        email: String,
        name: String,
    },
    OrderConfirmation {
        email: String,
        name: String,
        order_id: String,
        items: Vec<OrderLineItem>,
        shipping_address: AddressSnapshot,
    },
    ReturnRequested {
        email: String,
        name: String,
        order_id: String,
        return_id: String,
        reason: String,
    },
    ApplicationReceived {
        email: String,
        name: String,
        application_id: String,
        job_title: String,
        job_location: String,
    },
    BackInStock {
        email: String,
        name: String,
        products: Vec<RestockedProduct>,
    },
}

impl OutboxMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboxMessage::AccountCreated { .. } => "account_created",
            OutboxMessage::OrderConfirmation { .. } => "order_confirmation",
            OutboxMessage::ReturnRequested { .. } => "return_requested",
            OutboxMessage::ApplicationReceived { .. } => "application_received",
            OutboxMessage::BackInStock { .. } => "back_in_stock",
        }
    }

    pub fn render(&self) -> Result<RenderedEmail, EmailError> {
        match self {
            OutboxMessage::AccountCreated { email, name } => Ok(RenderedEmail {
                to: email.clone(),
                subject: "🎉 Your NILA Products Account is Ready!".into(),
                html: AccountCreatedHtml { name }.render()?,
            }),
            OutboxMessage::OrderConfirmation {
                email,
                name,
                order_id,
                items,
                shipping_address,
            } => {
                let subtotal: i64 = items.iter().map(|i| rupees_to_paise(i.line_total())).sum();
                let tax = percent_of(subtotal, 500);
                let lines = items
                    .iter()
                    .map(|item| EmailLine {
                        name: item.name.clone(),
                        quantity: item.quantity,
                        amount: format_paise(rupees_to_paise(item.line_total())),
                    })
                    .collect();
                let html = OrderConfirmationHtml {
                    name,
                    order_id,
                    lines,
                    subtotal: format_paise(subtotal),
                    tax: format_paise(tax),
                    grand_total: format_paise(subtotal + tax),
                    address: shipping_address,
                }
                .render()?;
                Ok(RenderedEmail {
                    to: email.clone(),
                    subject: format!("Order Confirmed: Your NILA Products Order #{order_id}"),
                    html,
                })
            }
            OutboxMessage::ReturnRequested {
                email,
                name,
                order_id,
                return_id,
                reason,
            } => Ok(RenderedEmail {
                to: email.clone(),
                subject: format!("Return Initiated for NILA Order #{order_id}"),
                html: ReturnRequestedHtml {
                    name,
                    order_id,
                    return_id,
                    reason,
                }
                .render()?,
            }),
            OutboxMessage::ApplicationReceived {
                email,
                name,
                application_id,
                job_title,
                job_location,
            } => Ok(RenderedEmail {
                to: email.clone(),
                subject: format!("Your Application for {job_title} at NILA Products"),
                html: ApplicationReceivedHtml {
                    name,
                    application_id,
                    job_title,
                    job_location,
                }
                .render()?,
            }),
            OutboxMessage::BackInStock {
                email,
                name,
                products,
            } => {
                let products = products
                    .iter()
                    .map(|p| RestockLine {
                        name: p.name.clone(),
                        price: format_paise(rupees_to_paise(p.price)),
                    })
                    .collect();
                Ok(RenderedEmail {
                    to: email.clone(),
                    subject: "An item you wanted is back in stock!".into(),
                    html: BackInStockHtml { name, products }.render()?,
                })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub fn render_otp(to: &str, otp: &str, valid_minutes: i64) -> Result<RenderedEmail, EmailError> {
    Ok(RenderedEmail {
        to: to.to_string(),
        subject: "Your NILA OTP Code".into(),
        html: OtpHtml { otp, valid_minutes }.render()?,
    })
}

/// SMTP sender. Without SMTP configuration every send fails with
/// [`EmailError::NotConfigured`].
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl Mailer {
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self, EmailError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Some(transport),
            from_address: config.from.clone(),
        })
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: String::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send(&self, email: &RenderedEmail) -> Result<(), EmailError> {
        let transport = self.transport.as_ref().ok_or(EmailError::NotConfigured)?;

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())?;

        transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Six-digit one-time password.
pub fn generate_otp() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kurti(quantity: i32) -> OrderLineItem {
        OrderLineItem {
            id: "item002".into(),
            name: "Urban Comfort Kurti".into(),
            price: 1299,
            quantity,
            image: None,
            description: None,
        }
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn order_confirmation_shows_tax_and_total() {
        let message = OutboxMessage::OrderConfirmation {
            email: "alice@example.com".into(),
            name: "Alice".into(),
            order_id: "ORD04213".into(),
            items: vec![kurti(2)],
            shipping_address: AddressSnapshot {
                address: "14 Lake Road".into(),
                city: "Coimbatore".into(),
                state: "Tamil Nadu".into(),
                pincode: "641001".into(),
                country: "India".into(),
                phone: "9876543210".into(),
            },
        };
        let email = message.render().unwrap();
        assert_eq!(email.subject, "Order Confirmed: Your NILA Products Order #ORD04213");
        assert!(email.html.contains("2,598.00"));
        assert!(email.html.contains("129.90"));
        assert!(email.html.contains("2,727.90"));
        assert!(email.html.contains("Coimbatore"));
    }

    #[test]
    fn back_in_stock_lists_every_product() {
        let message = OutboxMessage::BackInStock {
            email: "alice@example.com".into(),
            name: "Alice".into(),
            products: vec![
                RestockedProduct {
                    id: "item008".into(),
                    name: "Handloom Cotton Towels".into(),
                    price: 999,
                },
                RestockedProduct {
                    id: "item006".into(),
                    name: "Bridal Lehenga".into(),
                    price: 25000,
                },
            ],
        };
        let email = message.render().unwrap();
        assert_eq!(email.subject, "An item you wanted is back in stock!");
        assert!(email.html.contains("Handloom Cotton Towels"));
        assert!(email.html.contains("25,000.00"));
    }

    #[test]
    fn template_output_is_escaped() {
        let email = OutboxMessage::AccountCreated {
            email: "x@example.com".into(),
            name: "<script>".into(),
        }
        .render()
        .unwrap();
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn messages_round_trip_through_outbox_payload() {
        let message = OutboxMessage::ReturnRequested {
            email: "alice@example.com".into(),
            name: "Alice".into(),
            order_id: "ORD04213".into(),
            return_id: "RET00017".into(),
            reason: "Wrong size".into(),
        };
        let payload = serde_json::to_value(&message).unwrap();
        assert_eq!(payload["kind"], message.kind());
        let back: OutboxMessage = serde_json::from_value(payload).unwrap();
        assert_eq!(back, message);
    }

    #[tokio::test]
    async fn disabled_mailer_refuses_to_send() {
        let mailer = Mailer::disabled();
        let email = render_otp("alice@example.com", "123456", 5).unwrap();
        assert!(matches!(mailer.send(&email).await, Err(EmailError::NotConfigured)));
    }
}
