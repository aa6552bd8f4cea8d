//! Admin dashboard: all orders, all users, and the live order feed.

use std::fmt::Write as _;

use clap::Subcommand;
use futures::StreamExt;
use kos_core::{OrderId, OrderStatus, UserId, format_price};
use kos_storefront::api::{AdminEvent, Order, User};
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use tracing::warn;

use super::report;

#[derive(Debug, Subcommand)]
pub enum AdminAction {
    /// List every order
    Orders,
    /// List every account
    Users,
    /// Move an order to a new status
    SetStatus {
        /// Order id
        id: OrderId,
        /// placed, confirmed, shipped, delivered or cancelled
        status: OrderStatus,
    },
    /// Grant admin rights to an account
    SetAdmin {
        /// User id
        id: UserId,
        /// Revoke instead of grant
        #[arg(long)]
        revoke: bool,
    },
    /// Print order events as they happen
    Watch,
}

/// Run an admin command with the session's token.
///
/// # Errors
///
/// Returns an error if not signed in, the account is not an admin, or the
/// API request fails.
pub async fn run(state: &AppState, action: AdminAction) -> Result<(), AppError> {
    let token = state.session().token();
    let api = state.api();
    match action {
        AdminAction::Orders => {
            let orders = api.admin_orders(token.as_ref()).await?;
            report(&render_orders(&orders));
        }
        AdminAction::Users => {
            let users = api.admin_users(token.as_ref()).await?;
            report(&render_users(&users));
        }
        AdminAction::SetStatus { id, status } => {
            let order = api.update_order_status(&id, status, token.as_ref()).await?;
            report(&format!("Order #{} is now {}.", order.id, order.status));
        }
        AdminAction::SetAdmin { id, revoke } => {
            api.set_user_admin(&id, !revoke, token.as_ref()).await?;
            report(&if revoke {
                format!("User {id} is no longer an admin.")
            } else {
                format!("User {id} is now an admin.")
            });
        }
        AdminAction::Watch => {
            let events = api.admin_events(token.as_ref()).await?;
            let mut events = std::pin::pin!(events);
            report("Watching for orders. Press Ctrl-C to stop.");
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => {
                        if let Some(line) = render_event(&event) {
                            report(&line);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Admin feed interrupted");
                        return Err(e.into());
                    }
                }
            }
            report("Feed closed.");
        }
    }
    Ok(())
}

fn order_line(order: &Order) -> String {
    let (name, phone) = order
        .customer
        .as_ref()
        .map_or(("-", "-"), |c| (c.name.as_str(), c.phone.as_str()));
    let date = order
        .date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "#{:<6} {name:<20} {phone:<16} {date:<16} {:>14}  {}",
        order.id,
        format_price(order.totals.total, None),
        order.status
    )
}

fn render_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders.".to_string();
    }
    orders.iter().map(order_line).collect::<Vec<_>>().join("\n")
}

fn render_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users.".to_string();
    }
    let mut out = String::new();
    for (i, user) in users.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let joined = user
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let _ = write!(
            out,
            "{:>6}  {:<20} {:<28} {joined:<10}  {}",
            user.id,
            user.username.as_deref().unwrap_or("-"),
            user.email.as_deref().unwrap_or("-"),
            if user.is_admin { "Admin" } else { "User" }
        );
    }
    out
}

fn render_event(event: &AdminEvent) -> Option<String> {
    match event {
        AdminEvent::OrderCreated { order } => Some(format!("new     {}", order_line(order))),
        AdminEvent::OrderUpdated { order } => Some(format!("updated {}", order_line(order))),
        AdminEvent::Other => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order() -> Order {
        serde_json::from_value(serde_json::json!({
            "id": 77,
            "customer": {"name": "Mariam", "phone": "+974 5555 0000"},
            "totals": {"total": 60},
            "status": "confirmed",
            "createdAt": "2026-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_render_orders() {
        assert_eq!(render_orders(&[]), "No orders.");

        let out = render_orders(&[order()]);
        assert!(out.starts_with("#77"));
        assert!(out.contains("Mariam"));
        assert!(out.contains("QAR 60.00"));
        assert!(out.ends_with("confirmed"));
    }

    #[test]
    fn test_render_users_marks_admins() {
        let users: Vec<User> = serde_json::from_value(serde_json::json!([
            {"id": 1, "username": "owner", "email": "owner@kos.qa", "isAdmin": true,
             "createdAt": "2025-12-01T00:00:00Z"},
            {"id": 5, "username": "mariam", "email": "mariam@example.qa"}
        ]))
        .unwrap();

        let out = render_users(&users);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].contains("2025-12-01"));
        assert!(lines[0].ends_with("Admin"));
        assert!(lines[1].ends_with("User"));
    }

    #[test]
    fn test_render_event_skips_unknown() {
        assert!(render_event(&AdminEvent::Other).is_none());
        let line = render_event(&AdminEvent::OrderUpdated { order: order() }).unwrap();
        assert!(line.starts_with("updated #77"));
    }
}
