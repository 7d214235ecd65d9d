use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::layout::RepositoryLayout;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::log::LogEntry;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeBuilder, TreeHashes};
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct Repository {
    layout: RepositoryLayout,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Unable to create directory {}", path.display()))?;
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", path.display()))?;

        Ok(Self::with_layout(RepositoryLayout::new(path), writer))
    }

    pub fn with_layout(layout: RepositoryLayout, writer: Box<dyn std::io::Write>) -> Self {
        let index = Index::new(layout.index_path().into_boxed_path());
        let database = Database::new(layout.objects_path().into_boxed_path());
        let workspace = Workspace::new(layout.root().to_path_buf().into_boxed_path());
        let refs = Refs::new(layout.git_path().into_boxed_path());

        Repository {
            layout,
            writer: RefCell::new(writer),
            index: Arc::new(Mutex::new(index)),
            database,
            workspace,
            refs,
        }
    }

    pub fn path(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn ensure_initialized(&self) -> anyhow::Result<()> {
        if !self.layout.is_initialized() {
            anyhow::bail!(
                "not a git repository: {}",
                self.layout.git_path().display()
            );
        }

        Ok(())
    }

    /// Store a tree object for every directory staged in `index`
    ///
    /// Returns `None` when nothing is staged; nothing is written in that case.
    pub fn write_tree(&self, index: &Index) -> anyhow::Result<Option<TreeHashes>> {
        let builder = TreeBuilder::build(index.blob_entries())?;

        builder.traverse(&mut |dir_path: &str, tree: &Tree| {
            let stored = self.database.store(tree)?;
            debug!(dir = dir_path, oid = %stored.oid(), "stored tree");
            Ok(())
        })
    }

    /// Commits reachable from HEAD, newest first
    pub fn history(&self) -> anyhow::Result<Vec<LogEntry>> {
        let head = self.refs.read_head()?;

        RevList::new(&self.database, head).collect()
    }

    pub fn head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.refs.read_head()
    }
}
