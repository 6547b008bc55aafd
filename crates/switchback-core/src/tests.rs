#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::builder::TreeScaffold;
    use crate::destination::RouteDestination;
    use crate::key::KeySource;
    use crate::mutator;
    use crate::node::{
        NavNode, PaneBackBehavior, PaneRole, ScreenNode, StackNode, TabItem, TabNode, screen_keys,
    };
    use crate::registry::{
        ContainerInfo, NoPaneRoles, PaneRoleTable, ScopeTable,
    };
    use crate::resolver::{BackResolution, WindowSizeClass, resolve_back};

    fn scopes() -> ScopeTable {
        ScopeTable::new()
            .with_scope("MainTabs", ["home", "home/detail", "search", "profile"])
            .with_scope("ProductFlow", ["products/{id}"])
    }

    /// Root stack holding one tab container: three tabs, one screen each,
    /// home active.
    fn tab_fixture() -> (Arc<NavNode>, KeySource) {
        let (root, keys) = TreeScaffold::new()
            .tabs(
                Some("MainTabs"),
                0,
                vec![
                    (TabItem::new("Home", "home"), RouteDestination::shared("home")),
                    (
                        TabItem::new("Search", "search"),
                        RouteDestination::shared("search"),
                    ),
                    (
                        TabItem::new("Profile", "profile"),
                        RouteDestination::shared("profile"),
                    ),
                ],
            )
            .build();
        root.validate();
        (root, keys)
    }

    fn pane_fixture(behavior: PaneBackBehavior) -> (Arc<NavNode>, KeySource) {
        let (root, keys) = TreeScaffold::new()
            .panes(
                vec![
                    (PaneRole::Primary, RouteDestination::shared("list")),
                    (PaneRole::Supporting, RouteDestination::shared("detail")),
                ],
                PaneRole::Primary,
                behavior,
                None,
            )
            .build();
        root.validate();
        (root, keys)
    }

    fn push(root: &Arc<NavNode>, route: &str, keys: &KeySource) -> Arc<NavNode> {
        mutator::push(
            root,
            RouteDestination::shared(route),
            &scopes(),
            &NoPaneRoles,
            keys,
        )
    }

    fn tabs_of(root: &Arc<NavNode>) -> Arc<NavNode> {
        root.as_stack().unwrap().children[0].clone()
    }

    #[test]
    fn in_scope_push_lands_in_the_active_tab_stack() {
        let (root, keys) = tab_fixture();
        let next = push(&root, "home/detail", &keys);
        next.validate();
        insta::assert_snapshot!(
            next.outline(),
            @"[Tabs@0[[home, home/detail], [search], [profile]]]"
        );
        assert_eq!(next.active_leaf().unwrap().destination.route(), "home/detail");

        // Untouched sibling tabs keep their identity.
        let old_tabs = tabs_of(&root);
        let new_tabs = tabs_of(&next);
        assert!(!Arc::ptr_eq(&old_tabs, &new_tabs));
        let old_tabs = old_tabs.as_tabs().unwrap();
        let new_tabs = new_tabs.as_tabs().unwrap();
        assert!(Arc::ptr_eq(&old_tabs.stacks[1], &new_tabs.stacks[1]));
        assert!(Arc::ptr_eq(&old_tabs.stacks[2], &new_tabs.stacks[2]));
    }

    #[test]
    fn out_of_scope_push_becomes_a_sibling_of_the_container() {
        let (root, keys) = tab_fixture();
        let step1 = push(&root, "home/detail", &keys);
        let step2 = push(&step1, "products/{id}", &keys);
        step2.validate();
        insta::assert_snapshot!(
            step2.outline(),
            @"[Tabs@0[[home, home/detail], [search], [profile]], [products/{id}]]"
        );
        assert_eq!(
            step2.active_leaf().unwrap().destination.route(),
            "products/{id}"
        );
        // The tab container itself is carried over untouched.
        assert!(Arc::ptr_eq(&tabs_of(&step1), &tabs_of(&step2)));
    }

    #[test]
    fn back_removes_the_covering_sibling_and_restores_the_tabs() {
        let (root, keys) = tab_fixture();
        let step1 = push(&root, "home/detail", &keys);
        let step2 = push(&step1, "products/{id}", &keys);
        let BackResolution::Handled(step3) = resolve_back(&step2, WindowSizeClass::Compact)
        else {
            panic!("expected a handled back");
        };
        step3.validate();
        assert_eq!(step3.outline(), step1.outline());
        assert_eq!(step3.active_leaf().unwrap().destination.route(), "home/detail");
        assert!(Arc::ptr_eq(&tabs_of(&step2), &tabs_of(&step3)));
    }

    #[test]
    fn switch_tab_preserves_inactive_stacks_verbatim() {
        let (root, keys) = tab_fixture();
        let step1 = push(&root, "home/detail", &keys);
        let tab_key = tabs_of(&step1).key();
        let step2 = mutator::switch_tab(&step1, tab_key, 2).unwrap();
        step2.validate();
        assert_eq!(step2.active_leaf().unwrap().destination.route(), "profile");
        let old_tabs = tabs_of(&step1);
        let new_tabs = tabs_of(&step2);
        assert!(Arc::ptr_eq(
            &old_tabs.as_tabs().unwrap().stacks[0],
            &new_tabs.as_tabs().unwrap().stacks[0]
        ));

        // Switching to the already-active tab is a no-op snapshot.
        let same = mutator::switch_tab(&step2, tab_key, 2).unwrap();
        assert!(Arc::ptr_eq(&step2, &same));
    }

    #[test]
    fn switch_tab_rejects_out_of_range_index() {
        let (root, _keys) = tab_fixture();
        let tab_key = tabs_of(&root).key();
        assert!(mutator::switch_tab(&root, tab_key, 9).is_err());
        assert!(mutator::switch_tab(&root, root.key(), 0).is_err());
    }

    #[test]
    fn back_on_initial_tab_with_single_screen_delegates_to_system() {
        let (root, _keys) = tab_fixture();
        assert!(matches!(
            resolve_back(&root, WindowSizeClass::Compact),
            BackResolution::DelegateToSystem
        ));
    }

    #[test]
    fn back_returns_to_the_initial_tab_first() {
        let (root, _keys) = tab_fixture();
        let tab_key = tabs_of(&root).key();
        let on_search = mutator::switch_tab(&root, tab_key, 1).unwrap();
        let BackResolution::Handled(next) = resolve_back(&on_search, WindowSizeClass::Compact)
        else {
            panic!("expected a handled back");
        };
        assert_eq!(next.active_leaf().unwrap().destination.route(), "home");
        assert_eq!(
            next.outline(),
            root.outline(),
            "returning home mutates only the active index"
        );
    }

    #[test]
    fn pop_inverts_in_scope_push() {
        let (root, keys) = tab_fixture();
        let pushed = push(&root, "home/detail", &keys);
        let popped = mutator::pop(&pushed).unwrap();
        assert_eq!(popped.outline(), root.outline());
        assert_eq!(screen_keys(&popped), screen_keys(&root));

        // A single-screen stack refuses to pop.
        assert!(mutator::pop(&popped).is_none());
    }

    #[test]
    fn pop_to_route_truncates_the_active_stack() {
        let (root, keys) = tab_fixture();
        let mut tree = root;
        for route in ["home/detail", "home/detail", "home/detail"] {
            tree = push(&tree, route, &keys);
        }
        let exclusive = mutator::pop_to_route(&tree, "home", false);
        insta::assert_snapshot!(
            exclusive.outline(),
            @"[Tabs@0[[home], [search], [profile]]]"
        );

        let unmatched = mutator::pop_to_route(&tree, "nowhere", false);
        assert!(Arc::ptr_eq(&tree, &unmatched), "no match, same snapshot");

        // Inclusive drops the matched screen as well; topmost match wins.
        let inclusive = mutator::pop_to_route(&tree, "home/detail", true);
        insta::assert_snapshot!(
            inclusive.outline(),
            @"[Tabs@0[[home, home/detail, home/detail], [search], [profile]]]"
        );
    }

    #[test]
    fn clear_and_push_keeps_the_stack_key_and_the_siblings() {
        let (root, keys) = tab_fixture();
        let pushed = push(&push(&root, "home/detail", &keys), "home/detail", &keys);
        let old_stack_key = pushed.active_stack().unwrap().key;
        let cleared = mutator::clear_and_push(&pushed, RouteDestination::shared("home"), &keys);
        cleared.validate();
        assert_eq!(cleared.active_stack().unwrap().key, old_stack_key);
        insta::assert_snapshot!(
            cleared.outline(),
            @"[Tabs@0[[home], [search], [profile]]]"
        );
        let old_tabs = tabs_of(&pushed);
        let new_tabs = tabs_of(&cleared);
        assert!(Arc::ptr_eq(
            &old_tabs.as_tabs().unwrap().stacks[1],
            &new_tabs.as_tabs().unwrap().stacks[1]
        ));
    }

    #[test]
    fn replace_current_produces_exactly_one_new_screen() {
        let (root, keys) = tab_fixture();
        let pushed = push(&root, "home/detail", &keys);
        let before = screen_keys(&pushed);
        let replaced =
            mutator::replace_current(&pushed, RouteDestination::shared("search"), &keys);
        let after = screen_keys(&replaced);
        assert_eq!(before.difference(&after).count(), 1);
        assert_eq!(after.difference(&before).count(), 1);
        assert_eq!(replaced.active_leaf().unwrap().destination.route(), "search");
    }

    #[test]
    fn nested_containers_innermost_decliner_wins() {
        // Outer tabs (scope Outer) whose first tab holds inner tabs (scope
        // Inner). A destination only the outer scope hosts must become a
        // sibling of the *inner* container, inside the outer tab's stack.
        let keys = KeySource::new();
        let scopes = ScopeTable::new()
            .with_scope("Outer", ["a", "x"])
            .with_scope("Inner", ["b"]);
        let root_key = keys.next();
        let outer_key = keys.next();
        let outer_stack_key = keys.next();
        let inner = TabNode::build(
            keys.next(),
            Some(outer_stack_key),
            vec![(TabItem::new("B", "b"), RouteDestination::shared("b"))],
            0,
            Some("Inner".into()),
            &keys,
        );
        let mut outer_stack = StackNode::new(outer_stack_key, Some(outer_key));
        outer_stack.children.push(Arc::new(NavNode::Tabs(inner)));
        let outer = TabNode {
            key: outer_key,
            parent_key: Some(root_key),
            stacks: vec![Arc::new(NavNode::Stack(outer_stack))],
            active_stack_index: 0,
            initial_stack_index: 0,
            items: vec![TabItem::new("A", "a")],
            scope_key: Some("Outer".into()),
            wrapper_key: None,
        };
        let mut root = StackNode::new(root_key, None);
        root.children.push(Arc::new(NavNode::Tabs(outer)));
        let root = Arc::new(NavNode::Stack(root));
        root.validate();

        let next = mutator::push(
            &root,
            RouteDestination::shared("x"),
            &scopes,
            &NoPaneRoles,
            &keys,
        );
        next.validate();
        insta::assert_snapshot!(
            next.outline(),
            @"[Tabs@0[[Tabs@0[[b]], [x]]]]"
        );
    }

    #[test]
    fn pane_push_routes_by_registered_role() {
        let (root, keys) = pane_fixture(PaneBackBehavior::default());
        let roles = PaneRoleTable::new().with_role("detail/{id}", PaneRole::Supporting);
        let next = mutator::push(
            &root,
            RouteDestination::shared("detail/{id}"),
            &scopes(),
            &roles,
            &keys,
        );
        next.validate();
        insta::assert_snapshot!(
            next.outline(),
            @"[Panes@Primary{Primary:[list], Supporting:[detail, detail/{id}]}]"
        );
        // The active pane did not move, so neither did the active leaf.
        assert_eq!(next.active_leaf().unwrap().destination.route(), "list");
    }

    #[test]
    fn pane_push_defaults_to_the_active_pane() {
        let (root, keys) = pane_fixture(PaneBackBehavior::default());
        let next = push(&root, "list/filter", &keys);
        next.validate();
        insta::assert_snapshot!(
            next.outline(),
            @"[Panes@Primary{Primary:[list, list/filter], Supporting:[detail]}]"
        );
    }

    #[test]
    fn pane_push_creates_a_stack_for_an_unconfigured_role() {
        let (root, keys) = pane_fixture(PaneBackBehavior::default());
        let roles = PaneRoleTable::new().with_role("aside", PaneRole::Extra);
        let next = mutator::push(
            &root,
            RouteDestination::shared("aside"),
            &scopes(),
            &roles,
            &keys,
        );
        next.validate();
        let pane = next.find_first_panes().unwrap();
        assert!(pane.has_role(PaneRole::Extra));
        assert_eq!(pane.active_pane_role, PaneRole::Primary);
    }

    #[test]
    fn switch_active_pane_requires_a_configured_role() {
        let (root, _keys) = pane_fixture(PaneBackBehavior::default());
        let pane_key = root.find_first_panes().unwrap().key;
        assert!(mutator::switch_active_pane(&root, pane_key, PaneRole::Extra).is_err());
        let next = mutator::switch_active_pane(&root, pane_key, PaneRole::Supporting).unwrap();
        assert_eq!(next.active_leaf().unwrap().destination.route(), "detail");
    }

    #[test]
    fn set_pane_configuration_adds_without_activating() {
        let (root, keys) = pane_fixture(PaneBackBehavior::default());
        let pane_key = root.find_first_panes().unwrap().key;
        let screen = Arc::new(NavNode::Screen(ScreenNode::new(
            keys.next(),
            None,
            RouteDestination::shared("aside"),
        )));
        let next =
            mutator::set_pane_configuration(&root, pane_key, PaneRole::Extra, screen, &keys)
                .unwrap();
        next.validate();
        let pane = next.find_first_panes().unwrap();
        assert!(pane.has_role(PaneRole::Extra));
        assert_eq!(pane.active_pane_role, PaneRole::Primary);
        // Non-stack content was wrapped.
        assert!(
            pane.configuration(PaneRole::Extra)
                .unwrap()
                .content
                .as_stack()
                .is_some()
        );
    }

    #[test]
    fn pop_pane_declines_on_a_single_entry() {
        let (root, keys) = pane_fixture(PaneBackBehavior::default());
        let pane_key = root.find_first_panes().unwrap().key;
        assert!(
            mutator::pop_pane(&root, pane_key, PaneRole::Primary)
                .unwrap()
                .is_none()
        );
        let pushed = push(&root, "list/filter", &keys);
        let popped = mutator::pop_pane(&pushed, pane_key, PaneRole::Primary)
            .unwrap()
            .unwrap();
        assert_eq!(popped.outline(), root.outline());
        assert!(matches!(
            mutator::pop_pane(&root, pane_key, PaneRole::Extra),
            Err(crate::error::NavError::UnknownPaneRole { .. })
        ));
    }

    #[test]
    fn compact_back_pops_the_active_pane_then_the_pane_itself() {
        let (root, keys) = pane_fixture(PaneBackBehavior::default());
        let pushed = push(&root, "list/filter", &keys);
        let BackResolution::Handled(next) = resolve_back(&pushed, WindowSizeClass::Compact)
        else {
            panic!("expected a handled back");
        };
        assert_eq!(next.outline(), root.outline());

        // Exhausted pane inside a larger stack: the pane node itself pops.
        let (root, _keys) = TreeScaffold::new()
            .screen(RouteDestination::shared("home"))
            .panes(
                vec![(PaneRole::Primary, RouteDestination::shared("list"))],
                PaneRole::Primary,
                PaneBackBehavior::default(),
                None,
            )
            .build();
        root.validate();

        let BackResolution::Handled(next) = resolve_back(&root, WindowSizeClass::Compact)
        else {
            panic!("expected a handled back");
        };
        insta::assert_snapshot!(next.outline(), @"[home]");
    }

    #[test]
    fn expanded_back_pops_whichever_pane_changes_the_layout() {
        let (root, keys) = pane_fixture(PaneBackBehavior::PopUntilLayoutChange);
        let roles = PaneRoleTable::new().with_role("detail/{id}", PaneRole::Supporting);
        let pushed = mutator::push(
            &root,
            RouteDestination::shared("detail/{id}"),
            &scopes(),
            &roles,
            &keys,
        );
        // Active pane (primary) has no history; the supporting pane does.
        let BackResolution::Handled(next) = resolve_back(&pushed, WindowSizeClass::Expanded)
        else {
            panic!("expected a handled back");
        };
        assert_eq!(next.outline(), root.outline());

        // With every stack at one entry, the secondary pane collapses.
        let BackResolution::Handled(next) = resolve_back(&root, WindowSizeClass::Expanded)
        else {
            panic!("expected a handled back");
        };
        insta::assert_snapshot!(next.outline(), @"[Panes@Primary{Primary:[list]}]");
    }

    #[test]
    fn expanded_delegate_to_primary_declines_when_primary_is_done() {
        let (root, _keys) = pane_fixture(PaneBackBehavior::DelegateToPrimary);
        assert!(matches!(
            resolve_back(&root, WindowSizeClass::Expanded),
            BackResolution::CannotHandle
        ));
    }

    #[test]
    fn declared_container_materialises_next_to_the_current_one() {
        let (root, keys) = tab_fixture();
        let info = ContainerInfo::new("ProductFlow", |key, parent, keys: &KeySource| {
            NavNode::Tabs(TabNode::build(
                key,
                parent,
                vec![(
                    TabItem::new("Product", "products/{id}"),
                    RouteDestination::shared("products/{id}"),
                )],
                0,
                Some("ProductFlow".into()),
                keys,
            ))
        });
        let next = mutator::push_container(&root, &info, &keys);
        next.validate();
        insta::assert_snapshot!(
            next.outline(),
            @"[Tabs@0[[home], [search], [profile]], Tabs@0[[products/{id}]]]"
        );
        assert_eq!(
            next.active_leaf().unwrap().destination.route(),
            "products/{id}"
        );
        assert!(Arc::ptr_eq(&tabs_of(&root), &tabs_of(&next)));
    }

    #[test]
    fn remove_node_detaches_a_stack_child() {
        let (root, keys) = tab_fixture();
        let covered = push(&root, "products/{id}", &keys);
        let sibling_key = covered.as_stack().unwrap().children[1].key();
        let next = mutator::remove_node(&covered, sibling_key).unwrap();
        assert_eq!(next.outline(), root.outline());
        assert!(mutator::remove_node(&next, sibling_key).is_none());
        assert!(mutator::remove_node(&next, next.key()).is_none());
    }

    #[test]
    fn keys_stay_unique_across_a_mutation_storm() {
        let (mut tree, keys) = tab_fixture();
        let tab_key = tabs_of(&tree).key();
        for i in 0..4 {
            tree = push(&tree, "home/detail", &keys);
            tree = mutator::switch_tab(&tree, tab_key, i % 3).unwrap();
            tree = push(&tree, "products/{id}", &keys);
            if let BackResolution::Handled(next) =
                resolve_back(&tree, WindowSizeClass::Compact)
            {
                tree = next;
            }
        }
        tree.validate();

        let mut seen = HashSet::new();
        crate::node::walk(&tree, &mut |node| {
            assert!(seen.insert(node.key()));
        });
    }

    #[test]
    fn replace_node_misses_unknown_keys() {
        let (root, keys) = tab_fixture();
        let stray = Arc::new(NavNode::Stack(StackNode::new(keys.next(), None)));
        assert!(mutator::replace_node(&root, keys.next(), stray).is_none());
    }
}
