//! Complex block promotion and materiality.
//!
//! The extractor emits every branching statement as a complex block
//! candidate. Promotion keeps candidates whose own complexity reaches the
//! block threshold; the rest dissolve into their parent, which inherits
//! their branch points and children, so totals are preserved.

use tracing::debug;

use crate::config::StyleGuide;
use crate::extract::{CodeUnit, UnitId, UnitKind, UnitTree};

/// Promote or dissolve every complex block candidate and fill in
/// `complexity` for all surviving units.
pub fn promote(mut tree: UnitTree, block_threshold: u32) -> UnitTree {
    let order = post_order(&tree);
    let mut dissolved = vec![false; tree.units.len()];

    for id in order {
        let unit = &tree.units[id.0];
        if !unit.candidate {
            continue;
        }
        let complexity = 1 + unit.branch_points;
        let covers_parent = unit
            .parent
            .and_then(|p| tree.units[p.0].sole_statement)
            .is_some_and(|(start, end)| {
                unit.span.start_byte == start && unit.span.end_byte <= end
            });

        if complexity >= block_threshold && !covers_parent {
            let unit = &mut tree.units[id.0];
            unit.candidate = false;
            debug!(line = unit.span.start_line, complexity, "promoted complex block");
            continue;
        }
        dissolve(&mut tree, id);
        dissolved[id.0] = true;
    }

    for unit in tree.units.iter_mut() {
        unit.complexity = 1 + unit.branch_points;
    }
    compact(tree, &dissolved)
}

/// Whether an undocumented `unit` is worth reporting.
pub fn is_material(unit: &CodeUnit, guide: &StyleGuide) -> bool {
    unit.complexity >= guide.thresholds.missing_complexity
        || guide.always_require.contains(&unit.kind)
}

fn post_order(tree: &UnitTree) -> Vec<UnitId> {
    fn walk(tree: &UnitTree, id: UnitId, out: &mut Vec<UnitId>) {
        for child in &tree.units[id.0].children {
            walk(tree, *child, out);
        }
        out.push(id);
    }
    let mut out = Vec::with_capacity(tree.units.len());
    for root in &tree.roots {
        walk(tree, *root, &mut out);
    }
    out
}

/// Move a candidate's branch points and children to its parent.
fn dissolve(tree: &mut UnitTree, id: UnitId) {
    let parent = tree.units[id.0].parent;
    let children = std::mem::take(&mut tree.units[id.0].children);
    let branch_points = tree.units[id.0].branch_points;
    for child in &children {
        tree.units[child.0].parent = parent;
    }

    let siblings = match parent {
        Some(p) => {
            tree.units[p.0].branch_points += branch_points;
            &mut tree.units[p.0].children
        }
        None => &mut tree.roots,
    };
    if let Some(pos) = siblings.iter().position(|s| *s == id) {
        siblings.splice(pos..=pos, children);
    }
}

/// Drop dissolved units and renumber the rest in document order.
fn compact(tree: UnitTree, dissolved: &[bool]) -> UnitTree {
    let mut remap = vec![None; tree.units.len()];
    let mut next = 0;
    for (old, gone) in dissolved.iter().enumerate() {
        if !gone {
            remap[old] = Some(UnitId(next));
            next += 1;
        }
    }
    let map = |id: UnitId| remap[id.0];

    let units = tree
        .units
        .into_iter()
        .filter(|u| !dissolved[u.id.0])
        .map(|mut u| {
            u.id = UnitId(remap[u.id.0].map_or(0, |n| n.0));
            u.parent = u.parent.and_then(map);
            u.children = u.children.iter().filter_map(|c| map(*c)).collect();
            u
        })
        .collect();
    let roots = tree.roots.iter().filter_map(|r| map(*r)).collect();
    UnitTree { units, roots }
}

/// Count of units per kind, for logging.
pub fn kind_counts(tree: &UnitTree) -> [(UnitKind, usize); 4] {
    let count = |k| tree.iter().filter(|u| u.kind == k).count();
    [
        (UnitKind::Function, count(UnitKind::Function)),
        (UnitKind::Method, count(UnitKind::Method)),
        (UnitKind::Class, count(UnitKind::Class)),
        (UnitKind::ComplexBlock, count(UnitKind::ComplexBlock)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::languages::frontend_for;
    use crate::extract::Language;

    fn promoted(source: &str, threshold: u32) -> UnitTree {
        let tree = frontend_for(Language::Python)
            .unwrap()
            .extract("t.py", source)
            .unwrap();
        let tree = promote(tree, threshold);
        tree.check_invariants().unwrap();
        tree
    }

    #[test]
    fn test_small_blocks_dissolve_into_function() {
        let mut src = String::from("def f(a):\n");
        for i in 0..6 {
            src.push_str(&format!("    if a == {}:\n        a += 1\n", i));
        }
        src.push_str("    return a\n");
        let tree = promoted(&src, 5);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.units[0].kind, UnitKind::Function);
        assert_eq!(tree.units[0].complexity, 7);
    }

    #[test]
    fn test_complex_block_is_promoted() {
        let src = "\
def f(a, b):
    total = 0
    if a and b:
        total = 1
    elif a or b:
        total = 2
    elif a > 2:
        total = 3
    return total
";
        let tree = promoted(src, 5);
        assert_eq!(tree.len(), 2);
        let block = &tree.units[1];
        assert_eq!(block.kind, UnitKind::ComplexBlock);
        assert_eq!(block.complexity, 6);
        assert_eq!(block.parent, Some(UnitId(0)));
        assert_eq!(tree.units[0].complexity, 1);
    }

    #[test]
    fn test_sole_statement_block_stays_with_function() {
        let src = "\
def f(a, b):
    \"\"\"Classify.\"\"\"
    if a and b:
        return 1
    elif a or b:
        return 2
    elif a > 2:
        return 3
";
        let tree = promoted(src, 5);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.units[0].complexity, 6);
    }

    #[test]
    fn test_nested_candidates_roll_up() {
        let src = "\
def f(items):
    count = 0
    for item in items:
        if item > 0:
            count += 1
        if item > 10 and item < 20:
            count += 2
    return count
";
        let tree = promoted(src, 5);
        assert_eq!(tree.len(), 2);
        let block = &tree.units[1];
        // for + if + if + and
        assert_eq!(block.complexity, 5);
        assert!(block.children.is_empty());
    }

    #[test]
    fn test_materiality() {
        let src = "def get(self):\n    return self.x\n";
        let tree = promoted(src, 5);
        let guide = StyleGuide::default();
        assert!(!is_material(&tree.units[0], &guide));

        let mut strict = StyleGuide::default();
        strict.always_require = vec![UnitKind::Function];
        assert!(is_material(&tree.units[0], &strict));
    }
}
