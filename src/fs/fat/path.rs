use super::entry::entries;
use super::volume::Volume;
use crate::disk::SectorDevice;
use crate::{Error, Result};

/// Split a `/` separated path into its non-empty components.
pub fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|x| !x.is_empty()).collect()
}

enum Scan {
    Found(u32),
    EndOfDirectory,
    Exhausted,
}

impl Volume {
    /// Resolve `path` to the first cluster of the directory it names.
    ///
    /// Every component must match a used, short-named directory entry
    /// exactly. An empty path is the root directory.
    pub fn find_cluster_number<S>(&mut self, disk: &mut dyn SectorDevice, path: &[S]) -> Result<u32>
    where
        S: AsRef<str>,
    {
        let root = self.root_cluster();
        if path.is_empty() {
            return Ok(root);
        }

        let mut cluster = root;
        self.read_cluster(disk, cluster)?;

        let mut visited = 0u64;
        let limit = self.max_chain_length();

        for (i, component) in path.iter().enumerate() {
            let component = component.as_ref();

            loop {
                match self.scan_for_directory(component) {
                    Scan::Found(found) => {
                        // ".." of a first level directory points at cluster 0
                        let found = if found == 0 { root } else { found };
                        trace!("{:?} -> cluster {}", component, found);

                        if i == path.len() - 1 {
                            return Ok(found);
                        }

                        cluster = found;
                        self.read_cluster(disk, cluster)?;
                        break;
                    }
                    Scan::EndOfDirectory => return Err(Error::NotFound),
                    Scan::Exhausted => {
                        visited += 1;
                        if visited > limit {
                            return Err(Error::CorruptedChain { cluster });
                        }

                        cluster = self.follow(disk, cluster)?.ok_or(Error::NotFound)?;
                        self.read_cluster(disk, cluster)?;
                    }
                }
            }
        }

        Err(Error::NotFound)
    }

    fn scan_for_directory(&self, name: &str) -> Scan {
        for entry in entries(self.cluster_buffer()) {
            if entry.is_end_of_directory() {
                return Scan::EndOfDirectory;
            }

            if entry.is_used()
                && !entry.is_long_name()
                && entry.is_directory()
                && entry.name_equals(name)
            {
                return Scan::Found(entry.first_cluster());
            }
        }

        Scan::Exhausted
    }
}
