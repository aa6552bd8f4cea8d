//! Account, order history, loyalty and contact commands.

use std::fmt::Write as _;

use clap::Args;
use kos_core::{RewardEntryKind, format_price};
use kos_storefront::api::{
    ApiError, AuthGrant, ContactMessage, LoginRequest, Order, RewardBalance, RewardEntry,
    SignupRequest,
};
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use secrecy::SecretString;
use tracing::warn;

use super::report;

#[derive(Debug, Args)]
pub struct SignupArgs {
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub email: String,
    #[arg(short, long, env = "KOS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(short, long, required_unless_present = "username", conflicts_with = "username")]
    pub email: Option<String>,
    #[arg(short, long)]
    pub username: Option<String>,
    #[arg(short, long, env = "KOS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Create an account and keep its token.
///
/// # Errors
///
/// Returns an error if the API rejects the signup.
pub async fn signup(state: &AppState, args: SignupArgs) -> Result<(), AppError> {
    let request = SignupRequest {
        username: args.username,
        email: args.email,
        password: SecretString::from(args.password),
    };
    let grant = state.api().signup(&request).await?;
    remember(state, grant);
    Ok(())
}

/// Sign in and keep the token.
///
/// # Errors
///
/// Returns an error if the credentials are rejected.
pub async fn login(state: &AppState, args: LoginArgs) -> Result<(), AppError> {
    let request = LoginRequest {
        email: args.email,
        username: args.username,
        password: SecretString::from(args.password),
    };
    let grant = state.api().login(&request).await?;
    remember(state, grant);
    Ok(())
}

fn remember(state: &AppState, grant: AuthGrant) {
    let name = grant
        .user
        .username
        .or(grant.user.email)
        .unwrap_or_else(|| grant.user.id.to_string());
    state.session().set(grant.token);
    report(&format!("Signed in as {name}."));
}

/// Sign out. The local token is forgotten even if the backend call fails.
pub async fn logout(state: &AppState) {
    if let Some(token) = state.session().token()
        && let Err(e) = state.api().logout(&token).await
    {
        warn!(error = %e, "Server-side logout failed");
    }
    state.session().clear();
    report("Signed out.");
}

/// Show the signed-in account.
///
/// # Errors
///
/// Returns `NotAuthenticated` without a session, or an error if the API
/// rejects the token.
pub async fn whoami(state: &AppState) -> Result<(), AppError> {
    let token = state.session().token().ok_or(ApiError::NotAuthenticated)?;
    let user = state.api().me(&token).await?;
    let mut out = format!(
        "{} <{}>",
        user.username.as_deref().unwrap_or("-"),
        user.email.as_deref().unwrap_or("-")
    );
    if user.is_admin {
        out.push_str(" (admin)");
    }
    report(&out);
    Ok(())
}

/// List past orders.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
pub async fn orders(state: &AppState) -> Result<(), AppError> {
    let orders = state.api().my_orders(state.session().token().as_ref()).await?;
    report(&render_orders(&orders));
    Ok(())
}

/// Show the loyalty balance and ledger.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
pub async fn rewards(state: &AppState) -> Result<(), AppError> {
    let token = state.session().token();
    let balance = state.api().reward_balance(token.as_ref()).await?;
    let history = state.api().reward_history(token.as_ref()).await?;
    report(&render_rewards(&balance, &history));
    Ok(())
}

/// Send a contact-form message.
///
/// # Errors
///
/// Returns an error if a field is blank or the API request fails.
pub async fn contact(
    state: &AppState,
    name: String,
    email: String,
    message: String,
) -> Result<(), AppError> {
    if [&name, &email, &message].iter().any(|v| v.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "name, email and message are required".to_string(),
        ));
    }
    state
        .api()
        .submit_contact(&ContactMessage {
            name,
            email,
            message,
        })
        .await?;
    report("Message sent. We'll get back to you soon.");
    Ok(())
}

fn render_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.".to_string();
    }
    let mut out = String::new();
    for order in orders {
        let date = order
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "#{}  {date}  {}  {}",
            order.id,
            order.status,
            format_price(order.totals.total, None)
        );
        for line in &order.items {
            let _ = writeln!(out, "    {} x {}", line.qty, line.name);
        }
    }
    out.trim_end().to_string()
}

fn render_rewards(balance: &RewardBalance, history: &[RewardEntry]) -> String {
    let mut out = format!(
        "{} points ({} tier)\n1 pt = {}; redeem up to {}% of an order; points expire after {} months",
        balance.points,
        balance.tier,
        format_price(balance.redeem_rate, None),
        (balance.max_redeem_pct * rust_decimal::Decimal::ONE_HUNDRED).round(),
        balance.expiry_months
    );
    if let Some(next) = balance.next_expiry_at {
        let _ = write!(out, "\nnext expiry: {}", next.format("%Y-%m-%d"));
    }
    for entry in history {
        let label = match entry.kind {
            RewardEntryKind::Earn => "Earned",
            RewardEntryKind::Redeem => "Redeemed",
            RewardEntryKind::Other => "Adjusted",
        };
        let date = entry
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let _ = write!(out, "\n{date}  {label:<8} {:+}", entry.delta);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rewards() {
        let balance = RewardBalance {
            points: 120,
            ..RewardBalance::default()
        };
        let history = vec![RewardEntry {
            kind: RewardEntryKind::Redeem,
            delta: -40,
            created_at: None,
        }];

        let out = render_rewards(&balance, &history);

        assert!(out.starts_with("120 points (Bronze tier)"));
        assert!(out.contains("1 pt = QAR 0.05"));
        assert!(out.contains("up to 50%"));
        assert!(out.ends_with("Redeemed -40"));
    }

    #[test]
    fn test_render_no_orders() {
        assert_eq!(render_orders(&[]), "No orders yet.");
    }
}
