//! Declarative record marshaling over DAG nodes.
//!
//! A record type describes itself by implementing [`Record`]: `encode` walks
//! the fields in declared order through a [`RecordWriter`], `decode` consumes
//! the field stream from a [`RecordReader`]. Scalar fields are inlined as
//! `Int`/`Bytes` field records; a child record is serialized first, bottom-up,
//! and contributes a present `Msg` marker plus one DAG link in appearance
//! order. There is no runtime reflection: the trait impl is the schema
//! table.
//!
//! Marshaling is pure. The tree of serialized nodes is handed back to the
//! caller, which persists it (or not); unmarshaling reads from a [`NodeSet`]
//! the caller has already resolved, typically via a bounded-depth DAG fetch.

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::field::{FieldRecord, WireType};
use crate::link::Link;
use crate::node::DagNode;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;

/// A resolved set of serialized nodes keyed by digest.
#[derive(Clone, Debug, Default)]
pub struct NodeSet {
    nodes: HashMap<Digest, Bytes>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a blob under its computed digest, returning the digest.
    pub fn insert(&mut self, bytes: Bytes) -> Digest {
        let digest = Digest::compute(&bytes);
        self.nodes.insert(digest.clone(), bytes);
        digest
    }

    pub fn get(&self, digest: &Digest) -> Option<&Bytes> {
        self.nodes.get(digest)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A type that can be marshaled to and from a DAG node tree.
pub trait Record: Sized + Default {
    fn encode(&self, w: &mut RecordWriter<'_>) -> Result<()>;
    fn decode(r: &mut RecordReader<'_>) -> Result<Self>;
}

/// Accumulates field records and links for one node while collecting the
/// serialized nodes of any children.
pub struct RecordWriter<'a> {
    buf: BytesMut,
    links: Vec<Link>,
    nodes: &'a mut Vec<(Digest, Bytes)>,
}

impl RecordWriter<'_> {
    pub fn uint(&mut self, id: u64, value: u64) {
        FieldRecord::int(id, value).encode(&mut self.buf);
    }

    pub fn uints(&mut self, id: u64, values: &[u64]) {
        for value in values {
            self.uint(id, *value);
        }
    }

    pub fn bytes(&mut self, id: u64, value: &[u8]) {
        FieldRecord::bytes(id, value.to_vec()).encode(&mut self.buf);
    }

    pub fn string(&mut self, id: u64, value: &str) {
        self.bytes(id, value.as_bytes());
    }

    pub fn strings(&mut self, id: u64, values: &[String]) {
        for value in values {
            self.string(id, value);
        }
    }

    /// Serialize `child` bottom-up, then emit a present `Msg` marker and
    /// append the child's DAG link.
    pub fn child<R: Record>(&mut self, id: u64, child: &R) -> Result<()> {
        let digest = marshal_into(child, self.nodes)?;
        FieldRecord::msg(id, true).encode(&mut self.buf);
        self.links.push(Link::dag(digest));
        Ok(())
    }

    pub fn children<R: Record>(&mut self, id: u64, items: &[R]) -> Result<()> {
        for item in items {
            self.child(id, item)?;
        }
        Ok(())
    }
}

fn marshal_into<R: Record>(record: &R, nodes: &mut Vec<(Digest, Bytes)>) -> Result<Digest> {
    let mut writer = RecordWriter {
        buf: BytesMut::new(),
        links: Vec::new(),
        nodes,
    };
    record.encode(&mut writer)?;
    let RecordWriter { buf, links, nodes } = writer;
    let data = DagNode::new(buf.freeze(), links).serialize();
    let digest = Digest::compute(&data);
    nodes.push((digest.clone(), data));
    Ok(digest)
}

/// Marshal a record tree. Returns the root digest and every serialized node
/// (children before parents), ready to be persisted.
pub fn marshal_tree<R: Record>(record: &R) -> Result<(Digest, Vec<(Digest, Bytes)>)> {
    let mut nodes = Vec::new();
    let root = marshal_into(record, &mut nodes)?;
    Ok((root, nodes))
}

/// Walks the field stream of one node, pairing `Msg` markers with links.
pub struct RecordReader<'a> {
    fields: std::vec::IntoIter<FieldRecord>,
    links: Vec<Link>,
    next_link: usize,
    set: &'a NodeSet,
}

impl<'a> RecordReader<'a> {
    /// Open the node stored under `digest` in `set`.
    pub fn open(digest: &Digest, set: &'a NodeSet) -> Result<Self> {
        let data = set
            .get(digest)
            .ok_or_else(|| Error::InvalidRecord(format!("missing node {digest}")))?;
        let node = DagNode::parse(data)?;
        let fields = FieldRecord::decode_all(&node.bytes)?;
        Ok(Self {
            fields: fields.into_iter(),
            links: node.links,
            next_link: 0,
            set,
        })
    }

    /// The next field record in wire order, if any.
    pub fn next_field(&mut self) -> Option<FieldRecord> {
        self.fields.next()
    }

    /// Decode the child record a present `Msg` field points at.
    pub fn child<R: Record>(&mut self, field: &FieldRecord) -> Result<R> {
        if field.wire != WireType::Msg {
            return Err(Error::InvalidRecord(format!(
                "field {} is not a message",
                field.id
            )));
        }
        if field.uint != 1 {
            return Err(Error::InvalidRecord(format!(
                "field {} has no presence bit",
                field.id
            )));
        }
        let link = self
            .links
            .get(self.next_link)
            .ok_or_else(|| {
                Error::InvalidRecord(format!("field {} has no matching link", field.id))
            })?
            .clone();
        self.next_link += 1;
        let mut sub = RecordReader::open(&link.digest, self.set)?;
        R::decode(&mut sub)
    }
}

/// Unmarshal a record tree rooted at `root` from a resolved node set.
pub fn unmarshal_tree<R: Record>(root: &Digest, set: &NodeSet) -> Result<R> {
    let mut reader = RecordReader::open(root, set)?;
    R::decode(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Leaf {
        value: u64,
        name: String,
    }

    impl Record for Leaf {
        fn encode(&self, w: &mut RecordWriter<'_>) -> Result<()> {
            w.uint(0, self.value);
            w.string(1, &self.name);
            Ok(())
        }

        fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
            let mut out = Self::default();
            while let Some(f) = r.next_field() {
                match (f.id, f.wire) {
                    (0, WireType::Int) => out.value = f.uint,
                    (1, WireType::Bytes) => out.name = f.as_string()?,
                    _ => return Err(Error::InvalidRecord(format!("unexpected field {}", f.id))),
                }
            }
            Ok(out)
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Root {
        tags: Vec<String>,
        counts: Vec<u64>,
        head: Leaf,
        rest: Vec<Leaf>,
    }

    impl Record for Root {
        fn encode(&self, w: &mut RecordWriter<'_>) -> Result<()> {
            w.strings(0, &self.tags);
            w.uints(1, &self.counts);
            w.child(2, &self.head)?;
            w.children(3, &self.rest)?;
            Ok(())
        }

        fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
            let mut out = Self::default();
            while let Some(f) = r.next_field() {
                match (f.id, f.wire) {
                    (0, WireType::Bytes) => out.tags.push(f.as_string()?),
                    (1, WireType::Int) => out.counts.push(f.uint),
                    (2, WireType::Msg) => out.head = r.child(&f)?,
                    (3, WireType::Msg) => out.rest.push(r.child(&f)?),
                    _ => return Err(Error::InvalidRecord(format!("unexpected field {}", f.id))),
                }
            }
            Ok(out)
        }
    }

    fn sample() -> Root {
        Root {
            tags: vec!["alpha".to_string(), "beta".to_string()],
            counts: vec![1, 2, 3],
            head: Leaf {
                value: 10,
                name: "head".to_string(),
            },
            rest: vec![
                Leaf {
                    value: 11,
                    name: "first".to_string(),
                },
                Leaf {
                    value: 12,
                    name: "second".to_string(),
                },
            ],
        }
    }

    fn into_set(nodes: Vec<(Digest, Bytes)>) -> NodeSet {
        let mut set = NodeSet::new();
        for (_, data) in nodes {
            set.insert(data);
        }
        set
    }

    #[test]
    fn test_roundtrip_nested_record() {
        let record = sample();
        let (root, nodes) = marshal_tree(&record).unwrap();
        // Three leaves plus the root.
        assert_eq!(nodes.len(), 4);

        let set = into_set(nodes);
        let decoded: Root = unmarshal_tree(&root, &set).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_children_serialize_before_parent() {
        let (root, nodes) = marshal_tree(&sample()).unwrap();
        assert_eq!(nodes.last().unwrap().0, root);
    }

    #[test]
    fn test_identical_subtrees_share_nodes() {
        let record = Root {
            rest: vec![Leaf::default(), Leaf::default()],
            ..Default::default()
        };
        let (_, nodes) = marshal_tree(&record).unwrap();
        let set = into_set(nodes);
        // Two identical children collapse to one stored node.
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_missing_child_node_fails() {
        let (root, mut nodes) = marshal_tree(&sample()).unwrap();
        // Drop one leaf from the resolved set.
        nodes.remove(0);
        let set = into_set(nodes);
        assert!(unmarshal_tree::<Root>(&root, &set).is_err());
    }

    #[test]
    fn test_deterministic_serialization() {
        let (root_a, _) = marshal_tree(&sample()).unwrap();
        let (root_b, _) = marshal_tree(&sample()).unwrap();
        assert_eq!(root_a, root_b);
    }
}
