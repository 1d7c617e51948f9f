pub mod health;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::auth::handlers as auth_handlers;
use crate::auth::middleware::{require_admin, require_auth};
use crate::chat::handlers as chat_handlers;
use crate::projects::handlers as project_handlers;
use crate::state::AppState;
use crate::store::guest;
use crate::{admin, billing, settings, share, uploads};

pub fn build_router(state: AppState) -> Router {
    // Admin surface: require_auth (from the protected router) runs first,
    // then the admin_users gate.
    let admin_routes = Router::new()
        .route("/users", get(admin::list_admin_users).post(admin::add_admin))
        .route("/users/:id", delete(admin::remove_admin))
        .route("/users/:id/roles", get(admin::list_user_roles))
        .route("/user-roles", post(admin::assign_role))
        .route("/user-roles/:id", delete(admin::remove_user_role))
        .route("/roles", get(admin::list_roles).post(admin::create_role))
        .route("/roles/:id", delete(admin::delete_role))
        .route(
            "/roles/:id/permissions",
            get(admin::list_role_permissions).post(admin::assign_permission),
        )
        .route(
            "/roles/:id/permissions/:permission_id",
            delete(admin::remove_permission),
        )
        .route("/permissions", get(admin::list_permissions))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let protected = Router::new()
        // Relay + chats
        .route("/chat", post(chat_handlers::handle_chat))
        .route(
            "/chats",
            get(chat_handlers::list_chats)
                .post(chat_handlers::create_chat)
                .delete(chat_handlers::delete_all_chats),
        )
        .route("/chats/archive-all", post(chat_handlers::archive_all_chats))
        .route(
            "/chats/:id",
            patch(chat_handlers::update_chat).delete(chat_handlers::delete_chat),
        )
        .route("/chats/:id/messages", get(chat_handlers::list_messages))
        .route(
            "/chats/:id/share",
            post(share::create_share_link).delete(share::delete_share_link),
        )
        // Projects
        .route("/projects/generate", post(project_handlers::handle_generate))
        .route("/projects", get(project_handlers::list_projects))
        .route(
            "/projects/:id",
            get(project_handlers::get_project)
                .patch(project_handlers::update_project)
                .delete(project_handlers::delete_project),
        )
        .route("/projects/:id/files", get(project_handlers::list_project_files))
        // Account
        .route("/auth/me", get(auth_handlers::me))
        .route(
            "/settings/preferences",
            get(settings::get_preferences).patch(settings::update_preferences),
        )
        .route(
            "/settings/family",
            get(settings::list_family_members).post(settings::add_family_member),
        )
        .route("/settings/family/:id", delete(settings::remove_family_member))
        .route("/settings/orders", get(settings::list_orders))
        .route("/settings/export", get(settings::export_data))
        // Billing
        .route("/billing/subscription", get(billing::get_subscription))
        .route(
            "/billing/subscription/cancel",
            post(billing::cancel_subscription),
        )
        .route("/billing/payment-methods", get(billing::list_payment_methods))
        .route("/billing/invoices", get(billing::list_invoices))
        // Attachments
        .route(
            "/uploads",
            post(uploads::upload_attachments).delete(uploads::delete_attachment),
        )
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/email-exists", get(auth_handlers::email_exists))
        .route("/share/:token", get(share::get_shared_conversation))
        .route(
            "/guest/usage",
            get(guest::get_guest_usage).post(guest::record_guest_usage),
        )
        .route("/billing/plans", get(billing::list_plans));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1", public.merge(protected))
        .with_state(state)
}
