//! Tests for voicetree-markdown: vault writing and the load round trip

use std::collections::BTreeSet;
use voicetree_core::{DecisionTree, NodeId};
use voicetree_markdown::{load_tree, MarkdownWriter};

fn three_node_tree() -> DecisionTree {
    let mut tree = DecisionTree::new();
    let root = tree.create_node(
        "Project Planning",
        None,
        "Overall planning notes for the project.",
        "Planning overview",
        "",
    );
    tree.create_node(
        "Timeline",
        Some(root),
        "Milestones land quarterly.",
        "Quarterly milestones",
        "schedule for",
    );
    tree.create_node(
        "Budget",
        Some(root),
        "Costs are tracked per team.",
        "Cost tracking",
        "constraint on",
    );
    tree
}

fn all_ids(tree: &DecisionTree) -> BTreeSet<NodeId> {
    tree.iter().map(|(id, _)| *id).collect()
}

// ===========================================================================
// Round trip (S6)
// ===========================================================================

#[test]
fn write_then_load_preserves_structure() {
    let dir = tempfile::tempdir().unwrap();
    let tree = three_node_tree();

    MarkdownWriter::new(dir.path()).write_nodes(&tree, &all_ids(&tree)).unwrap();
    let loaded = load_tree(dir.path()).unwrap();

    assert_eq!(loaded.node_count(), tree.node_count());
    for (&id, original) in tree.iter() {
        let restored = loaded.get(id).expect("node survived round trip");
        assert_eq!(restored.title, original.title);
        assert_eq!(restored.content, original.content);
        assert_eq!(restored.summary, original.summary);
        assert_eq!(restored.parent_id, original.parent_id);
        assert_eq!(restored.children, original.children);
        assert_eq!(restored.relationships, original.relationships);
    }
}

#[test]
fn reserialising_a_loaded_vault_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let tree = three_node_tree();
    MarkdownWriter::new(dir.path()).write_nodes(&tree, &all_ids(&tree)).unwrap();

    let loaded = load_tree(dir.path()).unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    MarkdownWriter::new(second_dir.path()).write_nodes(&loaded, &all_ids(&loaded)).unwrap();

    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let name = entry.unwrap().file_name();
        let first = std::fs::read_to_string(dir.path().join(&name)).unwrap();
        let second = std::fs::read_to_string(second_dir.path().join(&name)).unwrap();
        assert_eq!(strip_timestamps(&first), strip_timestamps(&second), "{:?} drifted", name);
    }
}

fn strip_timestamps(contents: &str) -> String {
    contents
        .lines()
        .filter(|l| !l.starts_with("created_at:") && !l.starts_with("modified_at:"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ===========================================================================
// File naming
// ===========================================================================

#[test]
fn filenames_follow_id_slug_convention() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = DecisionTree::new();
    tree.create_node("What? A weird / title!", None, "content", "s", "");
    MarkdownWriter::new(dir.path()).write_nodes(&tree, &all_ids(&tree)).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["1_What_A_weird_title.md"]);
}

#[test]
fn rewriting_a_node_keeps_its_filename() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = DecisionTree::new();
    let id = tree.create_node("Stable Name", None, "v1", "s", "");
    let writer = MarkdownWriter::new(dir.path());
    writer.write_nodes(&tree, &all_ids(&tree)).unwrap();

    tree.append_content(id, "v2", "").unwrap();
    writer.write_nodes(&tree, &all_ids(&tree)).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(names.len(), 1);
    let contents =
        std::fs::read_to_string(dir.path().join("1_Stable_Name.md")).unwrap();
    assert!(contents.contains("v1\nv2"));
}

// ===========================================================================
// Loader edge cases
// ===========================================================================

#[test]
fn loader_rejects_missing_directory() {
    assert!(load_tree("/definitely/not/a/vault").is_err());
}

#[test]
fn loader_skips_non_vault_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "just a readme").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not markdown").unwrap();

    let tree = three_node_tree();
    MarkdownWriter::new(dir.path()).write_nodes(&tree, &all_ids(&tree)).unwrap();

    let loaded = load_tree(dir.path()).unwrap();
    assert_eq!(loaded.node_count(), 3);
}

#[test]
fn loaded_tree_continues_id_assignment_past_maximum() {
    let dir = tempfile::tempdir().unwrap();
    let tree = three_node_tree();
    MarkdownWriter::new(dir.path()).write_nodes(&tree, &all_ids(&tree)).unwrap();

    let mut loaded = load_tree(dir.path()).unwrap();
    let new_id = loaded.create_node("Fresh", None, "c", "s", "");
    assert_eq!(new_id, 4);
}
