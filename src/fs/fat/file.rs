use super::entry::entries;
use super::volume::Volume;
use crate::disk::SectorDevice;
use crate::{Error, Result};
use std::cmp::min;
use std::collections::HashSet;

impl Volume {
    /// Read the whole content of `filename` inside the directory at `path`.
    ///
    /// Only the first cluster of the directory is searched. Content is cut
    /// short, without error, when the chain ends, is corrupted or cannot be
    /// read before `file_size` bytes were collected.
    pub fn read_file<S>(
        &mut self,
        disk: &mut dyn SectorDevice,
        path: &[S],
        filename: &str,
    ) -> Result<Vec<u8>>
    where
        S: AsRef<str>,
    {
        let directory = self.find_cluster_number(disk, path)?;
        self.read_cluster(disk, directory)?;

        let entry = entries(self.cluster_buffer())
            .take_while(|x| !x.is_end_of_directory())
            .find(|x| {
                x.is_used() && !x.is_long_name() && !x.is_directory() && x.name_equals(filename)
            })
            .ok_or(Error::NotFound)?;

        debug!(
            "{:?}: {} bytes from cluster {}",
            filename,
            entry.file_size,
            entry.first_cluster()
        );
        Ok(self.read_chain(disk, entry.first_cluster(), entry.file_size as usize))
    }

    /// Collect up to `size` bytes following the chain starting at `cluster`,
    /// each cluster is read at most once.
    pub fn read_chain(
        &mut self,
        disk: &mut dyn SectorDevice,
        mut cluster: u32,
        size: usize,
    ) -> Vec<u8> {
        let mut content = Vec::with_capacity(size);
        let cluster_size = self.cluster_size();
        let mut visited = HashSet::new();

        while content.len() < size {
            if !visited.insert(cluster) {
                warn!("file chain loops back to cluster {}", cluster);
                break;
            }

            if let Err(e) = self.read_cluster(disk, cluster) {
                warn!("file truncated at cluster {}: {}", cluster, e);
                break;
            }

            let n = min(cluster_size, size - content.len());
            content.extend_from_slice(&self.cluster_buffer()[..n]);

            if content.len() < size {
                match self.follow(disk, cluster) {
                    Ok(Some(next)) => cluster = next,
                    Ok(None) => {
                        warn!(
                            "chain ended after {} of {} bytes",
                            content.len(),
                            size
                        );
                        break;
                    }
                    Err(e) => {
                        warn!("file truncated after {} bytes: {}", content.len(), e);
                        break;
                    }
                }
            }
        }

        content
    }
}
