use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/genres", genre_routes())
        .nest("/titles", title_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::auth::*;

    OpenApiRouter::new()
        .routes(routes!(signup))
        .routes(routes!(obtain_token))
}

fn user_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::user::*;

    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_me, update_me))
        .routes(routes!(get_user, update_user, replace_user, delete_user))
}

fn category_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::category::*;

    OpenApiRouter::new()
        .routes(routes!(list_categories, create_category))
        .routes(routes!(get_category, update_category, delete_category))
}

fn genre_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::genre::*;

    OpenApiRouter::new()
        .routes(routes!(list_genres, create_genre))
        .routes(routes!(get_genre, update_genre, delete_genre))
}

/// Titles plus the reviews and comments nested under them. Every path starts
/// with `/{title_id}` so the router sees one parameter name per segment.
fn title_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(title_crud())
        .merge(review_routes())
        .merge(comment_routes())
}

fn title_crud() -> OpenApiRouter<AppState> {
    use crate::handlers::title::*;

    OpenApiRouter::new()
        .routes(routes!(list_titles, create_title))
        .routes(routes!(get_title, update_title, replace_title, delete_title))
}

fn review_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::review::*;

    OpenApiRouter::new()
        .routes(routes!(list_reviews, create_review))
        .routes(routes!(get_review, update_review, replace_review, delete_review))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::comment::*;

    OpenApiRouter::new()
        .routes(routes!(list_comments, create_comment))
        .routes(routes!(
            get_comment,
            update_comment,
            replace_comment,
            delete_comment
        ))
}
