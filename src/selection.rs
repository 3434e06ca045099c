use std::fmt;

use crate::api::models::{Contact, UserId};

pub type ContactId = UserId;

pub const MESSAGES_PATH: &str = "/messages";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Messages,
    /// The raw path segment, kept as a string so stale or malformed links
    /// still round-trip.
    Thread(String),
}

impl Route {
    pub fn thread(id: ContactId) -> Self {
        Route::Thread(id.to_string())
    }

    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.trim_end_matches('/').strip_prefix(MESSAGES_PATH)?;
        if rest.is_empty() {
            return Some(Route::Messages);
        }
        let id = rest.strip_prefix('/')?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Route::Thread(id.to_string()))
    }

    pub fn path(&self) -> String {
        match self {
            Route::Messages => MESSAGES_PATH.to_string(),
            Route::Thread(id) => format!("{}/{}", MESSAGES_PATH, id),
        }
    }

    pub fn contact_id(&self) -> Option<&str> {
        match self {
            Route::Messages => None,
            Route::Thread(id) => Some(id.as_str()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Contact to select automatically, if any: the first directory entry, but
/// only while nothing is selected yet.
pub fn decide_initial_selection(directory: &[Contact], current: Option<&str>) -> Option<ContactId> {
    if current.is_some() {
        return None;
    }
    directory.first().map(|c| c.id)
}

pub fn active_contact<'a>(directory: &'a [Contact], route_id: Option<&str>) -> Option<&'a Contact> {
    let wanted = route_id?;
    directory.iter().find(|c| c.id_string() == wanted)
}

#[derive(Debug, Default)]
pub struct ContactSelector {
    route: Route,
    explicit: bool,
}

impl ContactSelector {
    pub fn new(route: Route) -> Self {
        Self { route, explicit: false }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn contact_id(&self) -> Option<&str> {
        self.route.contact_id()
    }

    /// Record a navigation. `explicit` is true when the user picked the
    /// contact; after that, auto-selection stays off for the session.
    pub fn navigate(&mut self, route: Route, explicit: bool) {
        if explicit && route.contact_id().is_some() {
            self.explicit = true;
        }
        if self.route != route {
            log::info!("navigate {} -> {}", self.route, route);
            self.route = route;
        }
    }

    /// Called with the latest loaded directory whenever it or the route
    /// changes. Returns the route to navigate to, if auto-selection applies.
    pub fn observe_directory(&mut self, directory: &[Contact]) -> Option<Route> {
        if self.explicit {
            return None;
        }
        let id = decide_initial_selection(directory, self.contact_id())?;
        let route = Route::thread(id);
        self.navigate(route.clone(), false);
        Some(route)
    }

    pub fn active<'a>(&self, directory: &'a [Contact]) -> Option<&'a Contact> {
        active_contact(directory, self.contact_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contact(id: i64) -> Contact {
        Contact {
            id,
            full_name: format!("Contact {}", id),
            avatar_url: None,
            tradesman_profile: None,
            last_message: None,
            unread_count: 0,
        }
    }

    #[test]
    fn routes_parse_and_format() {
        assert_eq!(Route::parse("/messages"), Some(Route::Messages));
        assert_eq!(Route::parse("/messages/"), Some(Route::Messages));
        assert_eq!(Route::parse("/messages/12"), Some(Route::Thread("12".into())));
        assert_eq!(Route::parse("/messages/1/2"), None);
        assert_eq!(Route::parse("/profile"), None);
        assert_eq!(Route::thread(1).path(), "/messages/1");
    }

    #[test]
    fn first_contact_is_selected_when_route_is_empty() {
        let mut selector = ContactSelector::new(Route::Messages);
        let directory = vec![contact(1), contact(2)];
        assert_eq!(selector.observe_directory(&directory), Some(Route::thread(1)));
        assert_eq!(selector.route().path(), "/messages/1");
        assert_eq!(selector.active(&directory).map(|c| c.id), Some(1));
        assert_eq!(selector.observe_directory(&directory), None);
    }

    #[test]
    fn stale_link_shows_no_selection() {
        let mut selector = ContactSelector::new(Route::Thread("77".into()));
        let directory = vec![contact(1)];
        assert_eq!(selector.observe_directory(&directory), None);
        assert!(selector.active(&directory).is_none());
        assert_eq!(selector.contact_id(), Some("77"));
    }

    #[test]
    fn explicit_selection_disables_auto_select() {
        let mut selector = ContactSelector::new(Route::Messages);
        let directory = vec![contact(1), contact(2)];
        selector.navigate(Route::thread(2), true);
        selector.navigate(Route::Messages, false);
        assert_eq!(selector.observe_directory(&directory), None);
        assert_eq!(selector.route(), &Route::Messages);
    }

    #[test]
    fn empty_directory_selects_nothing() {
        let mut selector = ContactSelector::new(Route::Messages);
        assert_eq!(selector.observe_directory(&[]), None);
    }

    proptest! {
        #[test]
        fn auto_select_fires_exactly_once(ids in prop::collection::vec(1i64..10_000, 1..20)) {
            let directory: Vec<Contact> = ids.iter().copied().map(contact).collect();
            let mut selector = ContactSelector::new(Route::Messages);
            let mut navigations = Vec::new();
            for _ in 0..3 {
                if let Some(route) = selector.observe_directory(&directory) {
                    navigations.push(route);
                }
            }
            prop_assert_eq!(navigations, vec![Route::thread(ids[0])]);
        }

        #[test]
        fn set_route_never_navigates(
            ids in prop::collection::vec(1i64..10_000, 0..20),
            current in "[0-9a-z]{1,6}",
        ) {
            let directory: Vec<Contact> = ids.iter().copied().map(contact).collect();
            prop_assert_eq!(decide_initial_selection(&directory, Some(current.as_str())), None);
            let mut selector = ContactSelector::new(Route::Thread(current.clone()));
            prop_assert_eq!(selector.observe_directory(&directory), None);
            prop_assert_eq!(selector.contact_id(), Some(current.as_str()));
        }
    }
}
