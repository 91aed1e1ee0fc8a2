use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::App;

use super::{
    category::handlers::{
        create_category, delete_category, get_category, list_categories, update_category,
    },
    comment::{create::create_comment, delete::delete_comment, get::get_comments},
    post::handlers::{
        add_category, create_post, delete_post, downvote_post, get_post, list_posts,
        posts_by_category, recent_posts, remove_category, update_post, upvote_post,
    },
};

pub fn posts() -> Router<App> {
    Router::<App>::new()
        .route("/", post(create_post).get(list_posts))
        .route("/recent", get(recent_posts))
        .route("/category/{category_id}", get(posts_by_category))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/upvote", post(upvote_post))
        .route("/{id}/downvote", post(downvote_post))
        .route("/{id}/categories", post(add_category))
        .route("/{id}/categories/{category_id}", delete(remove_category))
}

pub fn categories() -> Router<App> {
    Router::<App>::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

pub fn comments() -> Router<App> {
    // GET takes the blog id, DELETE the comment id
    Router::<App>::new()
        .route("/", post(create_comment))
        .route("/{id}", get(get_comments).delete(delete_comment))
}
