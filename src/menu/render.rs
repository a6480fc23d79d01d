use crate::error::{AppError, AppResult};
use crate::gateway::{Button, Keyboard};
use crate::menu::tree::{Access, MenuTree, NodeKind};
use crate::models::Tier;

/// Screen text plus keyboard, ready to send or edit in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScreen {
    pub text: String,
    pub keyboard: Keyboard,
}

/// Renders the screen behind `key` for a viewer of the given tier.
///
/// Admins see every entry, everyone else only tier-"all" entries, in the
/// order the tree declares them. Redirects are followed before rendering.
/// An unknown key is a `NotFound` for the dispatcher to answer, never a
/// panic.
pub fn render(tree: &MenuTree, key: &str, tier: Tier) -> AppResult<RenderedScreen> {
    let mut node = tree.get(key).ok_or_else(|| AppError::NotFound {
        entity: "menu".to_string(),
        field: "key".to_string(),
        value: key.to_string(),
    })?;

    if let NodeKind::Redirect(target) = node {
        node = tree.get(target).ok_or_else(|| AppError::NotFound {
            entity: "menu".to_string(),
            field: "key".to_string(),
            value: (*target).to_string(),
        })?;
    }

    match node {
        NodeKind::Screen { text, entries } => {
            let mut keyboard = Keyboard::new();
            for entry in entries {
                if entry.required == Access::Admin && !tier.is_admin() {
                    continue;
                }
                let button = match tree.get(entry.target) {
                    Some(NodeKind::Link(url)) => Button::url(entry.label, *url),
                    _ => Button::callback(entry.label, entry.target),
                };
                keyboard.push_row(vec![button]);
            }
            Ok(RenderedScreen {
                text: (*text).to_string(),
                keyboard,
            })
        }
        _ => Err(AppError::NotFound {
            entity: "menu screen".to_string(),
            field: "key".to_string(),
            value: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ButtonKind;

    fn labels(screen: &RenderedScreen) -> Vec<&str> {
        screen
            .keyboard
            .rows
            .iter()
            .flatten()
            .map(|b| b.label.as_str())
            .collect()
    }

    #[test]
    fn admin_sees_every_entry_in_declared_order() {
        let tree = MenuTree::standard();
        let screen = render(&tree, "core_functions", Tier::Admin).expect("render");
        assert_eq!(
            labels(&screen),
            vec![
                "Who is on call",
                "Add a duty to the calendar",
                "Inventory",
                "Create a notification",
                "Create a marketplace lot",
                "Instant notification",
                "<<< Main menu",
            ]
        );
    }

    #[test]
    fn plain_user_sees_only_open_entries() {
        let tree = MenuTree::standard();
        let screen = render(&tree, "core_functions", Tier::User).expect("render");
        assert_eq!(labels(&screen), vec!["Who is on call", "<<< Main menu"]);
    }

    #[test]
    fn link_targets_render_as_url_buttons() {
        let tree = MenuTree::standard();
        let screen = render(&tree, "extras", Tier::User).expect("render");
        let developer = &screen.keyboard.rows[0][0];
        assert!(matches!(developer.kind, ButtonKind::Url(_)));
    }

    #[test]
    fn redirect_renders_its_target() {
        let tree = MenuTree::standard();
        let direct = render(&tree, "main_menu", Tier::User).expect("direct");
        let redirected = render(&tree, "back_to_main", Tier::User).expect("redirect");
        assert_eq!(direct, redirected);
    }

    #[test]
    fn unknown_key_is_not_found() {
        let tree = MenuTree::standard();
        let err = render(&tree, "no_such_menu", Tier::Admin).expect_err("missing");
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
