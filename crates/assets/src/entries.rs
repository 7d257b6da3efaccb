use std::collections::BTreeMap;

use packweave_core::Resource;

use crate::PackError;

/// A node of an in-memory pack: a file or a directory of named children.
///
/// Children are kept sorted so listing is deterministic.
#[derive(Debug, Clone)]
pub(crate) enum PackEntry {
    Resource(Resource),
    Directory(BTreeMap<String, PackEntry>),
}

impl Default for PackEntry {
    fn default() -> Self {
        PackEntry::Directory(BTreeMap::new())
    }
}

impl PackEntry {
    pub(crate) fn as_resource(&self) -> Option<&Resource> {
        match self {
            PackEntry::Resource(resource) => Some(resource),
            PackEntry::Directory(_) => None,
        }
    }

    pub(crate) fn as_directory(&self) -> Option<&BTreeMap<String, PackEntry>> {
        match self {
            PackEntry::Directory(children) => Some(children),
            PackEntry::Resource(_) => None,
        }
    }

    pub(crate) fn find<'a, I>(&self, path: I) -> Option<&PackEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter()
            .try_fold(self, |entry, segment| entry.as_directory()?.get(segment))
    }

    /// Visit every resource below this entry with its path relative to it.
    pub(crate) fn for_each_resource(&self, out: &mut dyn FnMut(&[String], &Resource)) {
        let mut path = Vec::new();
        self.walk(&mut path, out);
    }

    fn walk(&self, path: &mut Vec<String>, out: &mut dyn FnMut(&[String], &Resource)) {
        let Some(children) = self.as_directory() else {
            return;
        };
        for (name, child) in children {
            path.push(name.clone());
            match child {
                PackEntry::Resource(resource) => out(path.as_slice(), resource),
                PackEntry::Directory(_) => child.walk(path, out),
            }
            path.pop();
        }
    }

    /// Insert or overwrite the resource at `path`, creating directories.
    pub(crate) fn insert(&mut self, path: &[String], resource: Resource) -> Result<(), PackError> {
        let Some((file, dirs)) = path.split_last() else {
            return Err(PackError::EmptyPath);
        };
        let mut current = self;
        for segment in dirs {
            current = match current {
                PackEntry::Directory(children) => children.entry(segment.clone()).or_default(),
                PackEntry::Resource(_) => return Err(conflict(path)),
            };
        }
        match current {
            PackEntry::Directory(children) => {
                children.insert(file.clone(), PackEntry::Resource(resource));
                Ok(())
            }
            PackEntry::Resource(_) => Err(conflict(path)),
        }
    }
}

fn conflict(path: &[String]) -> PackError {
    PackError::PathConflict {
        path: path.join("/"),
    }
}
