use axum::{extract::State, response::Html, Extension};

use crate::error::Result;
use crate::models::{CurrentSession, Session};
use crate::services::{AuthEvent, ImageService, SessionController};
use crate::views::{render_console, render_image_list, ConsoleView};
use crate::AppState;

/// Management console, rendered for whichever mode the session puts it in
/// GET /manage
pub async fn console(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Html<String> {
    let mut controller = SessionController::new(state.policy.clone());
    let transition = controller.apply(AuthEvent::InitialSession(current.0));
    let mut view = ConsoleView::new(controller.into_mode());

    if transition.reload_required {
        if let Some(session) = view.mode.session().cloned() {
            let result =
                ImageService::reload(state.images.as_ref(), state.blobs.as_ref(), &session.user_id)
                    .await;
            view.apply_reload(result);
        }
    }

    Html(render_console(&view))
}

/// List fragment for the console's reload
/// GET /manage/images
pub async fn image_list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>> {
    let rows =
        ImageService::reload(state.images.as_ref(), state.blobs.as_ref(), &session.user_id).await?;
    Ok(Html(render_image_list(&rows)))
}
