//! Leptos bridge: mirrors the committed desktop snapshot into a signal for UI surfaces.
//!
//! Dock, menu bar and window chrome read [`DesktopContext::snapshot`] reactively and mutate only
//! through [`DesktopContext::api`].

use leptos::*;

use crate::{api::DesktopApi, model::DesktopSnapshot};

#[derive(Clone)]
/// Leptos context for reading desktop state and reaching the facade.
pub struct DesktopContext {
    /// Facade every mutation goes through.
    pub api: DesktopApi,
    /// Latest committed snapshot.
    pub snapshot: RwSignal<DesktopSnapshot>,
}

/// Subscribes a snapshot signal to `api` and provides it to descendants.
///
/// The subscription is released when the current reactive owner is cleaned up.
pub fn provide_desktop(api: DesktopApi) -> DesktopContext {
    let snapshot = create_rw_signal(api.get_state());
    let subscription = api.subscribe(move |next| snapshot.set(next.clone()));
    on_cleanup(move || subscription.unsubscribe());

    let context = DesktopContext { api, snapshot };
    provide_context(context.clone());
    context
}

#[component]
/// Provides [`DesktopContext`] to descendant components.
pub fn DesktopProvider(api: DesktopApi, children: Children) -> impl IntoView {
    provide_desktop(api);
    children().into_view()
}

/// Returns the current [`DesktopContext`], or `None` outside [`DesktopProvider`].
pub fn use_desktop() -> Option<DesktopContext> {
    use_context::<DesktopContext>()
}
