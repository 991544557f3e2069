use std::error::Error;

use labio::{
    array::{ArrayData, DataType},
    dataset::{DatasetBuilder, DatasetOps},
    group::{GroupBuilder, NodeFilter, Root},
    metadata::{MetadataError, MetadataValue},
    node::{Node, NodeError},
};

fn measurement() -> Result<Root, Box<dyn Error>> {
    let mut root = Root::new();
    let mut group = root.root_mut();
    group.metadata_mut().insert("operator", "J. Doe")?;
    group.create_group("a", GroupBuilder::new().metadata("temperature", 20.1))?;
    group.create_dataset(
        "a/baz",
        DatasetBuilder::new().shape(vec![100, 10]).metadata("unit", "V"),
    )?;
    group.create_dataset(
        "a/foo",
        DatasetBuilder::new()
            .shape(vec![100, 10])
            .data_type(DataType::Int32),
    )?;
    group.create_group("b", GroupBuilder::new())?;
    Ok(root)
}

#[test]
fn hierarchy_tree() -> Result<(), Box<dyn Error>> {
    let root = measurement()?;
    let tree = root.root().hierarchy_tree();
    println!("{tree}");
    assert_eq!(
        tree,
        "/
  a
    baz [100, 10] float64
    foo [100, 10] int32
  b
"
    );
    Ok(())
}

#[test]
fn hierarchy_auto_create_intermediates() -> Result<(), Box<dyn Error>> {
    let mut root = Root::new();
    root.root_mut().create_dataset("a/b/c", DatasetBuilder::new())?;
    let view = root.root();
    let datasets: Vec<_> = view.datasets().map(|dataset| dataset.name()).collect();
    assert_eq!(datasets, ["/a/b/c"]);
    let groups: Vec<_> = view.groups().map(|group| group.name()).collect();
    assert_eq!(groups, ["/a", "/a/b"]);
    assert_eq!(view.group("a")?.dataset("b/c")?.name(), "/a/b/c");
    assert_eq!(view.group("a/b")?.dataset("/c")?.name(), "/a/b/c");
    Ok(())
}

#[test]
fn hierarchy_uniqueness() -> Result<(), Box<dyn Error>> {
    let mut root = measurement()?;
    let before = root.root().len();
    let mut group = root.root_mut();
    let mut a = group.group_mut_at("a")?;
    assert!(matches!(
        a.create_dataset("baz", DatasetBuilder::new()),
        Err(NodeError::DuplicatePath(path)) if path == "/a/baz"
    ));
    assert!(matches!(
        a.create_group("foo/bar", GroupBuilder::new()),
        Err(NodeError::NotAGroup(path)) if path == "/a/foo"
    ));
    assert!(matches!(
        group.create_group("a", GroupBuilder::new()),
        Err(NodeError::DuplicatePath(_))
    ));
    assert!(matches!(
        group.create_group("a/", GroupBuilder::new()),
        Err(NodeError::DuplicatePath(_))
    ));
    assert_eq!(root.root().len(), before);
    Ok(())
}

#[test]
fn hierarchy_read_only_cascade() -> Result<(), Box<dyn Error>> {
    let mut root = measurement()?;
    root.root_mut().group_mut_at("a")?.set_read_only(true);
    {
        let view = root.root();
        assert!(!view.read_only());
        assert!(view.group("a")?.metadata().read_only());
        for dataset in view.group("a")?.datasets() {
            assert!(dataset.read_only());
            assert!(dataset.metadata().read_only());
        }
        assert!(!view.group("b")?.read_only());
    }

    let mut group = root.root_mut();
    assert!(matches!(
        group.group_mut_at("a")?.create_dataset("qux", DatasetBuilder::new()),
        Err(NodeError::ReadOnly(_))
    ));
    assert!(matches!(
        group.group_mut_at("a")?.remove("foo"),
        Err(NodeError::ReadOnly(_))
    ));
    let baz = group.dataset_mut("a/baz")?;
    assert!(baz.data_mut().is_err());
    assert!(matches!(
        baz.metadata_mut().insert("unit", "mV"),
        Err(MetadataError::ReadOnly(_))
    ));
    baz.set_read_only(false);
    baz.data_mut()?
        .as_array_mut::<f64>()
        .ok_or("not float64")?
        .fill(1.0);
    group.create_dataset("b/qux", DatasetBuilder::new())?;

    root.set_read_only(false);
    let mut group = root.root_mut();
    group.create_dataset("a/qux", DatasetBuilder::new())?;
    group.metadata_mut().insert("finished", true)?;
    Ok(())
}

#[test]
fn hierarchy_remove_cascade() -> Result<(), Box<dyn Error>> {
    let mut root = measurement()?;
    let baz = root.root().get_id("a/baz").ok_or("missing")?;
    root.root_mut().remove("a")?;
    let view = root.root();
    for path in ["a", "a/baz", "a/foo"] {
        assert!(matches!(view.get(path), Err(NodeError::PathNotFound(_))));
    }
    assert!(matches!(root.node(baz), Err(NodeError::InvalidNodeId(_))));
    assert_eq!(
        view.iter().map(|(path, _)| path).collect::<Vec<_>>(),
        ["/b"]
    );
    assert!(matches!(
        root.root_mut().remove("a/baz"),
        Err(NodeError::PathNotFound(_))
    ));

    let mut root = measurement()?;
    root.root_mut().group_mut_at("a")?.remove("foo")?;
    assert!(!root.root().contains("a/foo"));
    assert!(!root.root().group("a")?.contains("foo"));
    assert!(root.root().contains("a/baz"));
    Ok(())
}

#[test]
fn hierarchy_filters() -> Result<(), Box<dyn Error>> {
    let root = measurement()?;
    let view = root.root();
    let filter = NodeFilter::new().include("a/")?.exclude("foo")?;
    let datasets: Vec<_> = view
        .datasets_matching(&filter)
        .map(|dataset| dataset.name())
        .collect();
    assert_eq!(datasets, ["/a/baz"]);
    let filter = NodeFilter::new().include("b")?;
    let groups: Vec<_> = view
        .groups_matching(&filter)
        .map(|group| group.name())
        .collect();
    assert_eq!(groups, ["/b"]);
    let ancestors: Vec<_> = view
        .group("a")?
        .ancestors()
        .map(|group| group.name())
        .collect();
    assert_eq!(ancestors, ["/"]);
    assert_eq!(view.descendants().count(), 2);
    Ok(())
}

#[test]
fn hierarchy_node_access() -> Result<(), Box<dyn Error>> {
    let mut root = measurement()?;
    let view = root.root();
    assert!(matches!(view.get("a")?, Node::Group(_)));
    assert!(matches!(view.dataset("a"), Err(NodeError::NotADataset(_))));
    assert!(matches!(view.group("a/baz"), Err(NodeError::NotAGroup(_))));
    assert_eq!(
        view.group("a")?
            .metadata()
            .get("temperature")
            .and_then(MetadataValue::as_f64),
        Some(20.1)
    );
    assert_eq!(
        view.to_string(),
        "<Group '/' (2 groups, 2 datasets, 1 metadata)>"
    );
    assert_eq!(
        view.dataset("a/foo")?.to_string(),
        "<Dataset '/a/foo' shape=(100, 10) dtype='<i4' (0 metadata)>"
    );

    let mut group = root.root_mut();
    let foo = group.dataset_mut("a/foo")?;
    foo.data_mut()?
        .as_array_mut::<i32>()
        .ok_or("not int32")?
        .fill(2);
    let doubled = foo.add(&*foo)?;
    assert_eq!(doubled.sum()?, 4000.0);
    assert_eq!(doubled.name(), "add(/a/foo,/a/foo)");
    Ok(())
}

#[test]
fn hierarchy_add_group_copies_subtree() -> Result<(), Box<dyn Error>> {
    let source = measurement()?;
    let mut target = Root::new();
    target
        .root_mut()
        .add_group("copy/of/a", source.root().group("a")?)?;
    let copy = target.root().group("copy/of/a")?;
    assert_eq!(copy.metadata(), source.root().group("a")?.metadata());
    assert_eq!(
        copy.dataset("foo")?.data_type(),
        DataType::Int32
    );
    assert_eq!(
        *copy.dataset("baz")?.data(),
        ArrayData::zeros(&DataType::Float64, &[100, 10])
    );
    Ok(())
}
