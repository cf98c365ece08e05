#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dart_analyzer::{
    AnalysisContext, ChangeSet, MemoryIndexStore, Source, SourceFactory,
    vfs::{FileUriResolver, MemoryUriResolver, UriResolver},
};
use tempfile::TempDir;

/// A minimal `dart:core` with the types the fixtures mention.
pub const CORE: &str = "
class Object {
  bool operator ==(Object other) => true;
  String toString() => '';
}
class bool {}
class num {
  num operator +(num other) => this;
  num operator -(num other) => this;
}
class int extends num {
  int operator +(num other) => this;
  int operator -(num other) => this;
}
class double extends num {}
class String {
  int get length => 0;
  String operator +(String other) => this;
}
class List<E> {
  E operator [](int index) => null;
  void operator []=(int index, E value) {}
  void add(E value) {}
}
void print(Object object) {}
";

pub fn source(uri: &str) -> Source {
    Source::parse(uri).expect("valid uri")
}

pub fn memory_uri(name: &str) -> String {
    format!("file:///project/{name}")
}

/// Sources served from memory, plus the in-memory `dart:core`.
pub struct MemoryProject {
    pub files: Arc<MemoryUriResolver>,
    pub index: Arc<MemoryIndexStore>,
}

impl MemoryProject {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let resolver = Arc::new(MemoryUriResolver::new());
        resolver.add(source("dart:core"), CORE);
        for (name, text) in files {
            resolver.add(source(&memory_uri(name)), *text);
        }
        Self {
            files: resolver,
            index: Arc::new(MemoryIndexStore::new()),
        }
    }

    pub fn factory(&self) -> SourceFactory {
        SourceFactory::new(vec![self.files.clone() as Arc<dyn UriResolver>])
    }

    /// A context holding every named file.
    pub fn context(
        &self,
        names: &[&str],
    ) -> AnalysisContext {
        let context = AnalysisContext::new(self.factory(), self.index.clone());
        let changes = names.iter().fold(ChangeSet::new(), |changes, name| changes.added(source(&memory_uri(name))));
        context.changed(changes);
        context
    }

    pub fn set(
        &self,
        name: &str,
        text: &str,
    ) -> Source {
        let source = source(&memory_uri(name));
        self.files.add(source.clone(), text);
        source
    }
}

/// Sources written to a temporary directory and read back from disk, with
/// `dart:core` served from memory.
pub struct DiskProject {
    pub dir: TempDir,
    pub core: Arc<MemoryUriResolver>,
}

impl DiskProject {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        for (relative, text) in files {
            write_file(dir.path(), relative, text);
        }
        let core = Arc::new(MemoryUriResolver::new());
        core.add(source("dart:core"), CORE);
        Self {
            dir,
            core,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(
        &self,
        relative: &str,
    ) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn source(
        &self,
        relative: &str,
    ) -> Source {
        Source::from_path(&self.path(relative))
    }

    pub fn write(
        &self,
        relative: &str,
        text: &str,
    ) -> Source {
        write_file(self.dir.path(), relative, text);
        self.source(relative)
    }

    pub fn factory(&self) -> SourceFactory {
        SourceFactory::new(vec![self.core.clone() as Arc<dyn UriResolver>, Arc::new(FileUriResolver)])
    }
}

fn write_file(
    root: &Path,
    relative: &str,
    text: &str,
) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directory");
    }
    std::fs::write(path, text).expect("write fixture");
}

/// Byte offset of the `nth` occurrence of `needle`.
pub fn offset_of_nth(
    text: &str,
    needle: &str,
    nth: usize,
) -> usize {
    text.match_indices(needle).nth(nth).unwrap_or_else(|| panic!("needle not found: {needle}")).0
}
