//! Unit tests for the motion search.
//!
//! Buffers are built inline; positions are zero-based `(line, col)`.

#[cfg(test)]
mod helpers {
    use std::collections::VecDeque;

    use rustc_hash::FxHashMap;

    use crate::document::Document;
    use crate::models::{MotionSpec, Position, View};
    use crate::motion::{Combine, Motion, VimMotion};

    pub fn vim(keys: &[&str]) -> Vec<VimMotion> {
        keys.iter()
            .map(|k| VimMotion::from_spec(&MotionSpec::new(*k, 1)).unwrap())
            .collect()
    }

    /// Motion defined by a plain function, for exercising the search without
    /// the built-in catalog.
    pub struct FnMotion {
        pub name: &'static str,
        pub cost: u32,
        pub step: fn(Position) -> Position,
    }

    impl Motion for FnMotion {
        fn name(&self) -> &str {
            self.name
        }

        fn cost(&self) -> u32 {
            self.cost
        }

        fn apply(&self, view: &View, document: &Document) -> Option<View> {
            let next = (self.step)(view.position());
            document.contains(next).then(|| view.moved_to(next))
        }
    }

    /// Keystroke model with no merging: every step is typed on its own.
    pub struct NoMerge;

    impl Combine<FnMotion> for NoMerge {
        fn keystrokes(&self, motion: &FnMotion, _count: u32) -> usize {
            motion.name.len()
        }

        fn mergeable(&self, _first: &FnMotion, _second: &FnMotion) -> bool {
            false
        }
    }

    pub fn right() -> FnMotion {
        FnMotion {
            name: "RIGHT",
            cost: 1,
            step: |p| Position::new(p.line, p.col + 1),
        }
    }

    pub fn down() -> FnMotion {
        FnMotion {
            name: "DOWN",
            cost: 1,
            step: |p| Position::new(p.line + 1, p.col),
        }
    }

    /// Breadth-first distances with unit costs, keeping the first view found
    /// for each position the same way the search does.
    pub fn unit_distances<M: Motion>(
        document: &Document,
        start: View,
        motions: &[M],
    ) -> FxHashMap<Position, u32> {
        let mut dist = FxHashMap::default();
        let mut queue = VecDeque::new();
        dist.insert(start.position(), 0);
        queue.push_back((start, 0));

        while let Some((view, d)) = queue.pop_front() {
            for motion in motions {
                if let Some(next) = motion.apply(&view, document) {
                    if !dist.contains_key(&next.position()) {
                        dist.insert(next.position(), d + 1);
                        queue.push_back((next, d + 1));
                    }
                }
            }
        }
        dist
    }

    pub fn prose() -> Document {
        Document::new(&[
            "The quick brown fox",
            "  jumps over (the) lazy_dog;",
            "",
            "and runs.",
        ])
    }
}

// ── Search results ────────────────────────────────────────────────────────────

#[cfg(test)]
mod search {
    use pretty_assertions::assert_eq;

    use super::helpers::*;
    use crate::document::Document;
    use crate::models::{Position, ResolvedMotion, View};
    use crate::motion::CountPrefix;
    use crate::pathfinder::{find_path, PathFinder, SearchError};

    #[test]
    fn grid_right_down_costs_four() {
        let doc = Document::new(&["...", "...", "..."]);
        let motions = [right(), down()];

        let route = find_path(&doc, View::new(0, 0), Position::new(2, 2), &motions, &NoMerge)
            .unwrap();

        assert_eq!(route.total_cost, 4);
        let end = route.replay(View::new(0, 0), &motions, &doc).unwrap();
        assert_eq!(end.position(), Position::new(2, 2));
        let names: Vec<&str> = route.steps.iter().map(|s| motions[s.motion].name).collect();
        assert_eq!(names, vec!["RIGHT", "RIGHT", "DOWN", "DOWN"]);
    }

    #[test]
    fn grid_with_count_prefix_merges_runs() {
        let doc = Document::new(&["...", "...", "..."]);
        let motions = vim(&["l", "j"]);

        let route = find_path(&doc, View::new(0, 0), Position::new(2, 2), &motions, &CountPrefix)
            .unwrap();

        assert_eq!(route.total_cost, 4);
        assert_eq!(
            route.resolve(&motions),
            vec![ResolvedMotion::new("l", 2), ResolvedMotion::new("j", 2)]
        );
    }

    #[test]
    fn start_equals_target_is_empty() {
        let doc = prose();
        let motions = vim(&["h", "l", "w"]);
        let route = find_path(&doc, View::new(1, 4), Position::new(1, 4), &motions, &CountPrefix)
            .unwrap();
        assert!(route.is_trivial());
        assert_eq!(route.total_cost, 0);
    }

    #[test]
    fn unreachable_target_fails() {
        let doc = Document::new(&["...", "..."]);
        let motions = [right()];
        let err = find_path(&doc, View::new(0, 0), Position::new(1, 0), &motions, &NoMerge)
            .unwrap_err();
        match err {
            SearchError::NoPathFound { from, to } => {
                assert_eq!(from, Position::new(0, 0));
                assert_eq!(to, Position::new(1, 0));
            }
            other => panic!("expected NoPathFound, got {other:?}"),
        }
    }

    #[test]
    fn out_of_bounds_positions_rejected() {
        let doc = Document::new(&["abc"]);
        let motions = vim(&["l"]);
        let err = find_path(&doc, View::new(0, 0), Position::new(0, 3), &motions, &CountPrefix)
            .unwrap_err();
        assert!(matches!(err, SearchError::OutOfBounds(p) if p == Position::new(0, 3)));

        let err = find_path(&doc, View::new(4, 0), Position::new(0, 0), &motions, &CountPrefix)
            .unwrap_err();
        assert!(matches!(err, SearchError::OutOfBounds(p) if p == Position::new(4, 0)));
    }

    #[test]
    fn cheaper_route_replaces_expensive_one() {
        let doc = Document::new(&["....."]);
        let motions = [
            FnMotion {
                name: "JUMP2",
                cost: 10,
                step: |p| Position::new(p.line, p.col + 2),
            },
            right(),
        ];

        let mut finder = PathFinder::new(&doc, &motions);
        let route = finder
            .find_path(View::new(0, 0), Position::new(0, 2), &NoMerge)
            .unwrap();

        assert_eq!(route.total_cost, 2);
        assert!(route.steps.iter().all(|s| s.motion == 1));

        let target = finder.node_at(Position::new(0, 2)).unwrap();
        assert_eq!(target.g, 2);
        assert_eq!(target.incoming, vec![1]);
        let parent = target.parent.unwrap();
        assert_eq!(finder.nodes()[parent.index()].position(), Position::new(0, 1));
    }

    #[test]
    fn weights_steer_the_choice() {
        let doc = Document::new(&["one two three"]);
        let heavy_w = vec![
            crate::models::MotionSpec::new("l", 1),
            crate::models::MotionSpec::new("w", 5),
        ];
        let motions = crate::motion::VimMotion::from_specs(&heavy_w).unwrap();

        let route = find_path(&doc, View::new(0, 0), Position::new(0, 4), &motions, &CountPrefix)
            .unwrap();
        assert_eq!(route.total_cost, 4);
        assert_eq!(route.resolve(&motions), vec![ResolvedMotion::new("l", 4)]);

        let light_w = vec![
            crate::models::MotionSpec::new("l", 1),
            crate::models::MotionSpec::new("w", 1),
        ];
        let motions = crate::motion::VimMotion::from_specs(&light_w).unwrap();
        let route = find_path(&doc, View::new(0, 0), Position::new(0, 4), &motions, &CountPrefix)
            .unwrap();
        assert_eq!(route.total_cost, 1);
        assert_eq!(route.resolve(&motions), vec![ResolvedMotion::new("w", 1)]);
    }

    #[test]
    fn routes_replay_to_target_at_minimum_cost() {
        let doc = prose();
        let motions = vim(&["h", "l", "0", "$", "w", "b", "e", "gg", "G"]);
        let start = View::new(0, 0);
        let distances = unit_distances(&doc, start, &motions);

        for target in [
            Position::new(0, 18),
            Position::new(1, 15),
            Position::new(1, 27),
            Position::new(2, 0),
            Position::new(3, 4),
            Position::new(3, 8),
        ] {
            let route = find_path(&doc, start, target, &motions, &CountPrefix).unwrap();
            let end = route.replay(start, &motions, &doc).unwrap();
            assert_eq!(end.position(), target, "route to {target} lands elsewhere");
            assert_eq!(route.total_cost, distances[&target], "route to {target} not minimal");

            let step_cost: u32 = route.steps.iter().map(|s| s.count).sum();
            assert_eq!(step_cost, route.total_cost);
        }
    }
}

// ── Node table invariants ─────────────────────────────────────────────────────

#[cfg(test)]
mod table {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::helpers::*;
    use crate::models::{Position, ResolvedMotion, View};
    use crate::motion::CountPrefix;
    use crate::pathfinder::PathFinder;

    #[test]
    fn one_node_per_position_with_minimal_cost() {
        let doc = prose();
        let motions = vim(&["h", "l", "j", "k", "w", "b", "0", "$"]);
        let start = View::new(0, 4);
        let distances = unit_distances(&doc, start, &motions);

        let mut finder = PathFinder::new(&doc, &motions);
        finder
            .find_path(start, Position::new(3, 8), &CountPrefix)
            .unwrap();

        let mut seen = HashSet::new();
        for node in finder.nodes() {
            assert!(seen.insert(node.position()), "duplicate node for {}", node.position());
            let best = distances[&node.position()];
            if node.closed {
                assert_eq!(node.g, best, "closed node {} not optimal", node.position());
            } else {
                assert!(node.g >= best);
            }
        }
    }

    #[test]
    fn equal_cost_first_motions_are_both_kept() {
        let doc = crate::document::Document::new(&["ab cd"]);
        let motions = vim(&["e", "l"]);

        let mut finder = PathFinder::new(&doc, &motions);
        finder
            .find_path(View::new(0, 0), Position::new(0, 3), &CountPrefix)
            .unwrap();

        let node = finder.node_at(Position::new(0, 1)).unwrap();
        assert_eq!(node.incoming, vec![0, 1]);
        assert_eq!(node.g, 1);
    }

    #[test]
    fn equal_cost_from_another_parent_is_not_merged() {
        let doc = crate::document::Document::new(&["ab", "cd"]);
        let motions = [right(), down()];

        let mut finder = PathFinder::new(&doc, &motions);
        finder
            .find_path(View::new(0, 0), Position::new(1, 1), &NoMerge)
            .unwrap();

        // Reached at cost 2 through (0,1) first; the route through (1,0)
        // ties but has a different parent.
        let node = finder.node_at(Position::new(1, 1)).unwrap();
        assert_eq!(node.g, 2);
        assert_eq!(node.incoming, vec![1]);
        let parent = node.parent.unwrap();
        assert_eq!(finder.nodes()[parent.index()].position(), Position::new(0, 1));
    }

    #[test]
    fn refinement_prefers_the_motion_that_merges() {
        let doc = crate::document::Document::new(&["ab cd"]);
        let motions = vim(&["e", "l"]);

        let mut finder = PathFinder::new(&doc, &motions);
        let route = finder
            .find_path(View::new(0, 0), Position::new(0, 3), &CountPrefix)
            .unwrap();

        // `e l l` and `3l` cost the same; `3l` is fewer keys.
        assert_eq!(route.resolve(&motions), vec![ResolvedMotion::new("l", 3)]);
    }

    #[test]
    fn refinement_ties_keep_insertion_order() {
        let doc = crate::document::Document::new(&["ab cd"]);
        let motions = vim(&["e", "l"]);

        let mut finder = PathFinder::new(&doc, &motions);
        let route = finder
            .find_path(View::new(0, 0), Position::new(0, 2), &CountPrefix)
            .unwrap();

        // `e l` and `2l` are both two keys; the first configured motion wins.
        assert_eq!(
            route.resolve(&motions),
            vec![ResolvedMotion::new("e", 1), ResolvedMotion::new("l", 1)]
        );
    }

    #[test]
    fn repeated_runs_are_identical() {
        let doc = prose();
        let motions = vim(crate::motion::DEFAULT_MOTIONS);

        let mut finder = PathFinder::new(&doc, &motions);
        let first = finder
            .find_path(View::new(0, 0), Position::new(3, 6), &CountPrefix)
            .unwrap();
        let first_nodes = finder.nodes().len();
        let second = finder
            .find_path(View::new(0, 0), Position::new(3, 6), &CountPrefix)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first_nodes, finder.nodes().len());
    }
}

// ── Request entry point ───────────────────────────────────────────────────────

#[cfg(test)]
mod solve {
    use pretty_assertions::assert_eq;

    use crate::models::{MotionSpec, PathRequest, ResolvedMotion, View};
    use crate::pathfinder::{solve, SearchError};

    fn request(motions: &[&str]) -> PathRequest {
        PathRequest {
            start: View::new(0, 0),
            target: View::new(3, 0),
            motions: motions.iter().map(|m| MotionSpec::new(*m, 1)).collect(),
            scrolloff: 0,
            size: (80, 24),
            buffer: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        }
    }

    #[test]
    fn solves_with_catalog_motions() {
        let result = solve(&request(&["j", "k"])).unwrap();
        assert_eq!(result, vec![ResolvedMotion::new("j", 3)]);

        let result = solve(&request(&["j", "G"])).unwrap();
        assert_eq!(result, vec![ResolvedMotion::new("G", 1)]);
    }

    #[test]
    fn start_window_past_the_buffer_end_is_scrolled_back() {
        let request = PathRequest {
            start: View::new(0, 0).with_top_line(10),
            target: View::new(2, 0),
            motions: vec![MotionSpec::new("M", 1), MotionSpec::new("j", 1)],
            scrolloff: 0,
            size: (80, 3),
            buffer: vec!["a".into(), "b".into(), "c".into()],
        };

        let result = solve(&request).unwrap();
        assert_eq!(
            result,
            vec![ResolvedMotion::new("M", 1), ResolvedMotion::new("j", 1)]
        );
    }

    #[test]
    fn oversized_window_does_not_overflow() {
        let mut request = request(&["j", "L", "M"]);
        request.size = (usize::MAX, usize::MAX);
        request.start = View::new(0, 0).with_top_line(usize::MAX);

        let result = solve(&request).unwrap();
        assert_eq!(result, vec![ResolvedMotion::new("L", 1)]);
    }

    #[test]
    fn unknown_motion_fails_the_request() {
        let err = solve(&request(&["j", "<C-d>"])).unwrap_err();
        assert!(matches!(err, SearchError::UnknownMotion(ref m) if m == "<C-d>"));
    }
}
