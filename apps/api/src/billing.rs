//! Billing surface: the static plan catalog plus read access to the
//! Stripe-mirror rows. Checkout and portal sessions are created by external
//! Stripe tooling, not here.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::middleware::Claims;
use crate::errors::AppError;
use crate::models::billing::{InvoiceRow, PaymentMethodRow, SubscriptionRow};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u32,
    pub interval: &'static str,
    pub features: &'static [&'static str],
    pub stripe_price_id: &'static str,
}

pub const PLANS: &[Plan] = &[
    Plan {
        id: "free",
        name: "Free",
        price: 0,
        interval: "month",
        features: &[
            "1 AI model",
            "Up to 2 projects",
            "Limited AI generations per month",
            "Community support",
            "Public projects only",
        ],
        // Free plan never goes through checkout
        stripe_price_id: "",
    },
    Plan {
        id: "pro",
        name: "Pro",
        price: 20,
        interval: "month",
        features: &[
            "8 AI models",
            "Unlimited projects",
            "Unlimited AI generations",
            "Priority email support",
            "Custom domains",
            "Advanced analytics & usage insights",
            "Private projects",
            "Export projects (JSON / CSV)",
        ],
        stripe_price_id: "price_1ShK60E0VkO7z1VnHAKICksq",
    },
    Plan {
        id: "enterprise",
        name: "Enterprise",
        price: 100,
        interval: "month",
        features: &[
            "All Pro features included",
            "Unlimited AI models",
            "Dedicated account manager",
            "24/7 priority support",
            "Team collaboration & roles",
            "Single Sign-On (SSO)",
            "SLA uptime guarantee",
            "Custom billing & invoicing",
        ],
        stripe_price_id: "price_1XXXXXXXXXXXX",
    },
];

/// GET /api/v1/billing/plans
pub async fn list_plans() -> Json<&'static [Plan]> {
    Json(PLANS)
}

/// GET /api/v1/billing/subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Option<SubscriptionRow>>, AppError> {
    let subscription: Option<SubscriptionRow> =
        sqlx::query_as("SELECT * FROM subscriptions WHERE user_id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;

    Ok(Json(subscription))
}

/// GET /api/v1/billing/payment-methods
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PaymentMethodRow>>, AppError> {
    let methods: Vec<PaymentMethodRow> = sqlx::query_as(
        "SELECT * FROM payment_methods WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(claims.sub)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(methods))
}

/// GET /api/v1/billing/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<InvoiceRow>>, AppError> {
    let invoices: Vec<InvoiceRow> =
        sqlx::query_as("SELECT * FROM invoices WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(claims.sub)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(invoices))
}

/// POST /api/v1/billing/subscription/cancel
///
/// Flags the subscription to lapse at period end; the actual Stripe-side
/// cancellation is reconciled by external tooling.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SubscriptionRow>, AppError> {
    let subscription: Option<SubscriptionRow> = sqlx::query_as(
        r#"
        UPDATE subscriptions
        SET cancel_at_period_end = TRUE, updated_at = now()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(claims.sub)
    .fetch_optional(&state.db)
    .await?;

    subscription
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No active subscription".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_free_pro_enterprise_in_order() {
        let ids: Vec<&str> = PLANS.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["free", "pro", "enterprise"]);
    }

    #[test]
    fn free_plan_has_no_stripe_price() {
        let free = &PLANS[0];
        assert_eq!(free.price, 0);
        assert!(free.stripe_price_id.is_empty());
    }

    #[test]
    fn paid_plans_carry_stripe_prices() {
        for plan in PLANS.iter().filter(|p| p.price > 0) {
            assert!(
                !plan.stripe_price_id.is_empty(),
                "plan {} is missing a stripe price id",
                plan.id
            );
        }
    }
}
