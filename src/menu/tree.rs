use std::collections::HashMap;

/// Visibility requirement of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    All,
    Admin,
}

/// Every handler a menu entry can invoke. Closed set: the dispatcher
/// matches exhaustively, so a new action fails to compile until it is
/// handled everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Register,
    DutyNext,
    DutyList,
    DutyEntry,
    ToggleNews,
    ToggleMarketplace,
    Promote,
    Demote,
    ListUsers,
    ComingSoon,
}

impl MenuAction {
    /// Stable identifier used as the function-statistics row name.
    pub fn key(&self) -> &'static str {
        match self {
            MenuAction::Register => "register",
            MenuAction::DutyNext => "duty_next",
            MenuAction::DutyList => "duty_list",
            MenuAction::DutyEntry => "duty_entry",
            MenuAction::ToggleNews => "toggle_news",
            MenuAction::ToggleMarketplace => "toggle_marketplace",
            MenuAction::Promote => "promote",
            MenuAction::Demote => "demote",
            MenuAction::ListUsers => "list_users",
            MenuAction::ComingSoon => "coming_soon",
        }
    }

    /// Human-readable name for the usage leaderboard.
    pub fn display_name(&self) -> &'static str {
        match self {
            MenuAction::Register => "Registration",
            MenuAction::DutyNext => "Next on-call lookup",
            MenuAction::DutyList => "On-call schedule listing",
            MenuAction::DutyEntry => "On-call calendar entry",
            MenuAction::ToggleNews => "IT news subscription",
            MenuAction::ToggleMarketplace => "Marketplace subscription",
            MenuAction::Promote => "Admin rights grant",
            MenuAction::Demote => "Admin rights revoke",
            MenuAction::ListUsers => "User list",
            MenuAction::ComingSoon => "Upcoming feature",
        }
    }

    /// Leaderboard display name for a recorded statistics key, when the
    /// key belongs to a known action.
    pub fn display_name_for_key(key: &str) -> Option<&'static str> {
        const ALL: &[MenuAction] = &[
            MenuAction::Register,
            MenuAction::DutyNext,
            MenuAction::DutyList,
            MenuAction::DutyEntry,
            MenuAction::ToggleNews,
            MenuAction::ToggleMarketplace,
            MenuAction::Promote,
            MenuAction::Demote,
            MenuAction::ListUsers,
            MenuAction::ComingSoon,
        ];
        ALL.iter().find(|a| a.key() == key).map(|a| a.display_name())
    }
}

/// A button on a screen: label, who sees it, and the key of the node it
/// leads to.
#[derive(Debug, Clone)]
pub struct Entry {
    pub label: &'static str,
    pub required: Access,
    pub target: &'static str,
}

impl Entry {
    const fn new(label: &'static str, required: Access, target: &'static str) -> Self {
        Self {
            label,
            required,
            target,
        }
    }
}

/// What a menu key resolves to.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A screen with text and an ordered list of entries.
    Screen {
        text: &'static str,
        entries: Vec<Entry>,
    },
    /// A bound handler invocation.
    Action(MenuAction),
    /// An external URL, rendered as a link button, never dispatched.
    Link(&'static str),
    /// An alias resolving to another key.
    Redirect(&'static str),
}

/// The whole menu, keyed by callback data. Built once at startup.
pub struct MenuTree {
    nodes: HashMap<&'static str, NodeKind>,
}

impl MenuTree {
    pub fn get(&self, key: &str) -> Option<&NodeKind> {
        self.nodes.get(key)
    }

    /// The production tree: main menu with three sections, an on-call
    /// submenu, and back-navigation entries on every screen.
    pub fn standard() -> Self {
        let mut nodes: HashMap<&'static str, NodeKind> = HashMap::new();

        nodes.insert(
            "main_menu",
            NodeKind::Screen {
                text: "Main menu:",
                entries: vec![
                    Entry::new("Core functions", Access::All, "core_functions"),
                    Entry::new("Manage subscriptions", Access::All, "subscriptions"),
                    Entry::new("Extras", Access::All, "extras"),
                ],
            },
        );

        nodes.insert(
            "core_functions",
            NodeKind::Screen {
                text: "Core functions:",
                entries: vec![
                    Entry::new("Who is on call", Access::All, "duty_menu"),
                    Entry::new("Add a duty to the calendar", Access::Admin, "duty_entry"),
                    Entry::new("Inventory", Access::Admin, "inventory"),
                    Entry::new("Create a notification", Access::Admin, "create_notification"),
                    Entry::new("Create a marketplace lot", Access::Admin, "create_lot"),
                    Entry::new("Instant notification", Access::Admin, "urgent_message"),
                    Entry::new("<<< Main menu", Access::All, "main_menu"),
                ],
            },
        );

        nodes.insert(
            "subscriptions",
            NodeKind::Screen {
                text: "Manage subscriptions:",
                entries: vec![
                    Entry::new("IT department news", Access::All, "toggle_news"),
                    Entry::new("Defroster monitoring", Access::Admin, "defrosters"),
                    Entry::new("Faulty sensor monitoring", Access::Admin, "sensors"),
                    Entry::new("Marketplace", Access::All, "toggle_marketplace"),
                    Entry::new("<<< Main menu", Access::All, "main_menu"),
                ],
            },
        );

        nodes.insert(
            "extras",
            NodeKind::Screen {
                text: "Extras:",
                entries: vec![
                    Entry::new("Message the developer", Access::All, "contact_developer"),
                    Entry::new("List all users", Access::Admin, "list_users"),
                    Entry::new("Grant admin rights", Access::Admin, "promote"),
                    Entry::new("Revoke admin rights", Access::Admin, "demote"),
                    Entry::new("<<< Main menu", Access::All, "main_menu"),
                ],
            },
        );

        nodes.insert(
            "duty_menu",
            NodeKind::Screen {
                text: "Who is on call:",
                entries: vec![
                    Entry::new("Next on-call name", Access::All, "duty_next"),
                    Entry::new("On-call schedule", Access::All, "duty_list"),
                    Entry::new("<< Core functions", Access::All, "core_functions"),
                    Entry::new("<<< Main menu", Access::All, "main_menu"),
                ],
            },
        );

        nodes.insert("back_to_main", NodeKind::Redirect("main_menu"));

        nodes.insert("register", NodeKind::Action(MenuAction::Register));
        nodes.insert("duty_next", NodeKind::Action(MenuAction::DutyNext));
        nodes.insert("duty_list", NodeKind::Action(MenuAction::DutyList));
        nodes.insert("duty_entry", NodeKind::Action(MenuAction::DutyEntry));
        nodes.insert("toggle_news", NodeKind::Action(MenuAction::ToggleNews));
        nodes.insert(
            "toggle_marketplace",
            NodeKind::Action(MenuAction::ToggleMarketplace),
        );
        nodes.insert("promote", NodeKind::Action(MenuAction::Promote));
        nodes.insert("demote", NodeKind::Action(MenuAction::Demote));
        nodes.insert("list_users", NodeKind::Action(MenuAction::ListUsers));

        // Announced in the menu, not built yet.
        for key in [
            "inventory",
            "create_notification",
            "create_lot",
            "urgent_message",
            "defrosters",
            "sensors",
        ] {
            nodes.insert(key, NodeKind::Action(MenuAction::ComingSoon));
        }

        nodes.insert("contact_developer", NodeKind::Link("https://t.me/it_helpdesk"));

        Self { nodes }
    }
}
