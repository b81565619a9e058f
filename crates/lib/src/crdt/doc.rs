//! Document: root containers, transactions and update exchange.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    ops::{Deref, DerefMut},
    rc::{Rc, Weak},
    sync::Arc,
    thread,
};

use tracing::{debug, trace};
use yrs::{
    OffsetKind, Options, Out, ReadTxn, StateVector, Store, Transact, Update, WriteTxn,
    updates::{decoder::Decode, encoder::Encode},
};

use super::{CRDTError, Container, ContainerKind, ListRef, MapRef, Origin, TextRef, Value};

type Delivery = Box<dyn FnOnce()>;

pub(crate) struct DocInner {
    doc: yrs::Doc,
    /// Observer callbacks queued by a commit, run once the write lock is
    /// released.
    pending: RefCell<VecDeque<Delivery>>,
    flushing: Cell<bool>,
}

impl DocInner {
    pub(crate) fn enqueue(&self, delivery: Delivery) {
        self.pending.borrow_mut().push_back(delivery);
    }

    /// Runs queued deliveries in order. Deliveries queued while flushing
    /// (by transactions a callback commits) join the running loop.
    fn flush(&self) {
        if self.flushing.replace(true) {
            return;
        }
        let _reset = ResetOnDrop(&self.flushing);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(delivery) => delivery(),
                None => break,
            }
        }
    }
}

struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A shared document: a set of named root containers backed by a `yrs`
/// document.
///
/// `Doc` is a cheap handle; clones refer to the same document. Reads and
/// writes go through explicit transactions. At most one read-write
/// transaction is open at a time, and observers run after it commits.
///
/// # Examples
///
/// ```
/// # use treewatch::crdt::Doc;
/// let doc = Doc::new();
/// let root = doc.get_or_insert_map("root")?;
/// {
///     let mut txn = doc.transact_mut()?;
///     root.insert(&mut txn, "title", "Hello")?;
///     root.insert(&mut txn, "tags", vec!["a", "b"])?;
/// }
/// let txn = doc.transact()?;
/// assert_eq!(root.get(&txn, "title").unwrap(), "Hello");
/// # Ok::<(), treewatch::Error>(())
/// ```
#[derive(Clone)]
pub struct Doc(pub(crate) Rc<DocInner>);

impl Doc {
    /// Creates an empty document with a random client id.
    pub fn new() -> Self {
        Self::with_client_id(rand::random::<u32>() as u64)
    }

    pub fn with_client_id(client_id: u64) -> Self {
        let guid: Arc<str> = uuid::Uuid::new_v4().to_string().into();
        let options = Options {
            offset_kind: OffsetKind::Utf16,
            // Deleted containers stay readable through surviving handles
            skip_gc: true,
            ..Options::with_guid_and_client_id(guid, client_id)
        };
        Self(Rc::new(DocInner {
            doc: yrs::Doc::with_options(options),
            pending: RefCell::new(VecDeque::new()),
            flushing: Cell::new(false),
        }))
    }

    pub fn guid(&self) -> Arc<str> {
        self.0.doc.guid()
    }

    pub fn client_id(&self) -> u64 {
        self.0.doc.client_id()
    }

    /// Opens a read-only transaction.
    pub fn transact(&self) -> Result<yrs::Transaction<'_>, CRDTError> {
        Ok(self.0.doc.try_transact()?)
    }

    /// Opens a local read-write transaction. Observers see every write made
    /// through it together, once it is dropped.
    pub fn transact_mut(&self) -> Result<TransactionMut<'_>, CRDTError> {
        self.transact_mut_with(Origin::Local)
    }

    /// Like [`Doc::transact_mut`], tagging the resulting events with `origin`.
    pub fn transact_mut_with(&self, origin: Origin) -> Result<TransactionMut<'_>, CRDTError> {
        let txn = match &origin {
            Origin::Local => self.0.doc.try_transact_mut()?,
            Origin::Remote(peer) => self.0.doc.try_transact_mut_with(peer.as_str())?,
        };
        trace!(origin = ?origin, "transaction opened");
        Ok(TransactionMut {
            txn,
            deliver: DeliverOnDrop(self),
        })
    }

    pub fn get_or_insert_map(&self, name: &str) -> Result<MapRef, CRDTError> {
        self.transact_mut()?.get_or_insert_map(name)
    }

    pub fn get_or_insert_list(&self, name: &str) -> Result<ListRef, CRDTError> {
        self.transact_mut()?.get_or_insert_list(name)
    }

    pub fn get_or_insert_text(&self, name: &str) -> Result<TextRef, CRDTError> {
        self.transact_mut()?.get_or_insert_text(name)
    }

    /// The root container registered under `name`, if any.
    pub fn root<T: ReadTxn>(&self, txn: &T, name: &str) -> Option<Container> {
        txn.root_refs()
            .find(|(root, _)| *root == name)
            .and_then(|(_, out)| Value::from_out(out, self).as_container())
    }

    /// Names of all root containers, sorted.
    pub fn root_names<T: ReadTxn>(&self, txn: &T) -> Vec<String> {
        let mut names: Vec<_> = txn.root_refs().map(|(name, _)| name.to_string()).collect();
        names.sort();
        names
    }

    /// Snapshot of every root container.
    pub fn to_json<T: ReadTxn>(&self, txn: &T) -> serde_json::Value {
        serde_json::Value::Object(
            txn.root_refs()
                .map(|(name, out)| (name.to_string(), Value::from_out(out, self).to_json(txn)))
                .collect(),
        )
    }

    /// Encoded state vector, for a peer to compute what this document lacks.
    pub fn state_vector(&self) -> Result<Vec<u8>, CRDTError> {
        Ok(self.transact()?.state_vector().encode_v1())
    }

    /// Everything this document holds that a peer with `state_vector` has
    /// not seen. An empty state vector yields the whole document.
    pub fn encode_state_as_update(&self, state_vector: &[u8]) -> Result<Vec<u8>, CRDTError> {
        let state_vector = if state_vector.is_empty() {
            StateVector::default()
        } else {
            StateVector::decode_v1(state_vector).map_err(CRDTError::invalid_update)?
        };
        Ok(self.transact()?.encode_state_as_update_v1(&state_vector))
    }

    /// Merges an update produced by a peer. Observers see the result as one
    /// transaction tagged with `origin`.
    pub fn apply_update(&self, update: &[u8], origin: Origin) -> Result<(), CRDTError> {
        let bytes = update.len();
        let update = Update::decode_v1(update).map_err(CRDTError::invalid_update)?;
        let mut txn = self.transact_mut_with(origin)?;
        txn.apply_update(update).map_err(CRDTError::invalid_update)?;
        debug!(bytes, "applied update");
        Ok(())
    }

    pub(crate) fn downgrade(&self) -> Weak<DocInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<DocInner>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    pub(crate) fn same(&self, other: &Doc) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Doc {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Doc")
            .field("guid", &self.guid())
            .field("client_id", &self.client_id())
            .finish()
    }
}

/// An open read-write transaction.
///
/// Dropping it commits the writes, releases the document, and then runs
/// the observers of every container it changed. It dereferences to the
/// underlying [`yrs::TransactionMut`].
pub struct TransactionMut<'doc> {
    txn: yrs::TransactionMut<'doc>,
    // Dropped after `txn`: observers run once the commit has released the
    // document, so they may open transactions of their own.
    deliver: DeliverOnDrop<'doc>,
}

impl fmt::Debug for TransactionMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionMut")
            .field("doc", self.deliver.0)
            .finish_non_exhaustive()
    }
}

struct DeliverOnDrop<'doc>(&'doc Doc);

impl Drop for DeliverOnDrop<'_> {
    fn drop(&mut self) {
        // Queued deliveries survive a panic and run after the next commit
        if !thread::panicking() {
            self.0.0.flush();
        }
    }
}

impl<'doc> TransactionMut<'doc> {
    /// The document this transaction writes to.
    pub fn document(&self) -> &'doc Doc {
        self.deliver.0
    }

    pub fn get_or_insert_map(&mut self, name: &str) -> Result<MapRef, CRDTError> {
        self.check_root(name, ContainerKind::Map)?;
        let map = self.txn.get_or_insert_map(name);
        Ok(MapRef::new(self.document().clone(), map))
    }

    pub fn get_or_insert_list(&mut self, name: &str) -> Result<ListRef, CRDTError> {
        self.check_root(name, ContainerKind::List)?;
        let list = self.txn.get_or_insert_array(name);
        Ok(ListRef::new(self.document().clone(), list))
    }

    pub fn get_or_insert_text(&mut self, name: &str) -> Result<TextRef, CRDTError> {
        self.check_root(name, ContainerKind::Text)?;
        let text = self.txn.get_or_insert_text(name);
        Ok(TextRef::new(self.document().clone(), text))
    }

    /// Fails if `name` is already a root of another kind. Roots of undefined
    /// kind, as created by updates from peers, take the requested kind.
    fn check_root(&self, name: &str, kind: ContainerKind) -> Result<(), CRDTError> {
        let Some((_, existing)) = self.txn.root_refs().find(|(root, _)| *root == name) else {
            debug!(name, kind = %kind, "root container requested");
            return Ok(());
        };
        match ContainerKind::of(&existing) {
            Some(actual) if actual == kind => Ok(()),
            Some(actual) => Err(CRDTError::TypeMismatch {
                expected: kind.to_string(),
                actual: actual.to_string(),
            }),
            None if matches!(existing, Out::UndefinedRef(_)) => Ok(()),
            None => Err(CRDTError::TypeMismatch {
                expected: kind.to_string(),
                actual: "unsupported".to_string(),
            }),
        }
    }

    /// Fails unless this transaction writes to `doc`.
    pub(crate) fn check_owner(&self, doc: &Doc) -> Result<(), CRDTError> {
        if self.document().same(doc) {
            Ok(())
        } else {
            Err(CRDTError::ForeignTransaction)
        }
    }

    pub(crate) fn raw(&mut self) -> &mut yrs::TransactionMut<'doc> {
        &mut self.txn
    }
}

impl<'doc> Deref for TransactionMut<'doc> {
    type Target = yrs::TransactionMut<'doc>;

    fn deref(&self) -> &Self::Target {
        &self.txn
    }
}

impl DerefMut for TransactionMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.txn
    }
}

impl ReadTxn for TransactionMut<'_> {
    fn store(&self) -> &Store {
        self.txn.store()
    }
}
