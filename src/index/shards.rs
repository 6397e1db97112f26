//! Shard manager - capacity-ordered placement of vectors across devices
//!
//! Devices are filled strictly in order: the current device takes vectors
//! until it reaches capacity, then placement moves on to the next one. A
//! vector's global index is therefore the sum of the occupancies of all
//! lower-numbered devices plus its offset inside its own device, and never
//! changes once assigned.

use std::ops::Range;

use tracing::{debug, info};

use crate::backend::{BackendType, LocalIndex};
use crate::error::{Result, ShardError};

use super::vectors::VectorView;

/// Owns a fixed set of capacity-bounded device indexes
pub struct ShardManager {
    dimensions: usize,
    capacity_per_device: usize,
    backend_type: BackendType,
    devices: Vec<Box<dyn LocalIndex>>,
    occupancy: Vec<usize>,
    /// First device that still has free slots
    current: usize,
}

impl ShardManager {
    /// Allocate `num_devices` empty exact inner-product devices
    pub fn new(
        dimensions: usize,
        num_devices: usize,
        capacity_per_device: usize,
        backend_type: BackendType,
    ) -> Result<Self> {
        if num_devices < 1 {
            return Err(ShardError::Configuration(
                "num_devices must be at least 1".to_string(),
            ));
        }
        if capacity_per_device < 1 {
            return Err(ShardError::Configuration(
                "capacity_per_device must be at least 1".to_string(),
            ));
        }
        if dimensions < 1 {
            return Err(ShardError::Configuration(
                "dimension must be at least 1".to_string(),
            ));
        }
        if num_devices.checked_mul(capacity_per_device).is_none() {
            return Err(ShardError::Configuration(format!(
                "{} devices x {} vectors overflows the addressable capacity",
                num_devices, capacity_per_device
            )));
        }

        let devices = (0..num_devices)
            .map(|_| backend_type.create(dimensions))
            .collect();

        info!(
            "Initialized {} {} devices ({} dims, {} vectors per device)",
            num_devices, backend_type, dimensions, capacity_per_device
        );

        Ok(Self {
            dimensions,
            capacity_per_device,
            backend_type,
            devices,
            occupancy: vec![0; num_devices],
            current: 0,
        })
    }

    /// Append a batch, filling the current device before spilling into the next.
    ///
    /// Returns the global index range assigned to the batch. Width and
    /// aggregate capacity are checked before any device is touched.
    pub fn add<'a>(&mut self, vectors: impl Into<VectorView<'a>>) -> Result<Range<usize>> {
        let vectors = vectors.into();

        if vectors.dimensions() != self.dimensions {
            return Err(ShardError::DimensionMismatch {
                expected: self.dimensions,
                got: vectors.dimensions(),
            });
        }

        let requested = vectors.len();
        let available = self.total_capacity() - self.len();
        if requested > available {
            return Err(ShardError::CapacityExceeded {
                requested,
                available,
            });
        }

        let first = self.len();
        let mut start = 0;

        while start < requested {
            let device = self.current;
            let free = self.capacity_per_device - self.occupancy[device];
            let take = free.min(requested - start);

            self.devices[device]
                .add(vectors.slice(start..start + take))
                .map_err(|e| match e {
                    ShardError::Backend { .. } => e,
                    other => ShardError::Backend {
                        device,
                        message: other.to_string(),
                    },
                })?;

            self.occupancy[device] += take;
            start += take;
            debug!("Placed {} vectors on device {}", take, device);

            // Move to next device if current one is full
            if self.occupancy[device] == self.capacity_per_device && device + 1 < self.devices.len() {
                self.current = device + 1;
            }
        }

        info!("Vectors per device after addition: {:?}", self.occupancy);

        Ok(first..first + requested)
    }

    /// Current occupancy of every device, in device order
    pub fn device_occupancy(&self) -> &[usize] {
        &self.occupancy
    }

    /// Global index of the first vector on each device (prefix sums)
    pub fn device_offsets(&self) -> Vec<usize> {
        self.occupancy
            .iter()
            .scan(0usize, |acc, &n| {
                let offset = *acc;
                *acc += n;
                Some(offset)
            })
            .collect()
    }

    /// Map a global index back to (device, local offset)
    pub fn locate(&self, global: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (device, &n) in self.occupancy.iter().enumerate() {
            if global < offset + n {
                return Some((device, global - offset));
            }
            offset += n;
        }
        None
    }

    pub(crate) fn devices(&self) -> &[Box<dyn LocalIndex>] {
        &self.devices
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    pub fn capacity_per_device(&self) -> usize {
        self.capacity_per_device
    }

    pub fn backend_type(&self) -> BackendType {
        self.backend_type
    }

    pub fn total_capacity(&self) -> usize {
        self.devices.len() * self.capacity_per_device
    }

    /// Total vectors across all devices
    pub fn len(&self) -> usize {
        self.occupancy.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorBatch;

    fn batch(n: usize, dims: usize) -> VectorBatch {
        VectorBatch::new(dims, (0..n * dims).map(|i| i as f32).collect()).unwrap()
    }

    fn manager(num_devices: usize, capacity: usize) -> ShardManager {
        ShardManager::new(2, num_devices, capacity, BackendType::Flat).unwrap()
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            ShardManager::new(4, 0, 3, BackendType::Flat),
            Err(ShardError::Configuration(_))
        ));
        assert!(matches!(
            ShardManager::new(4, 2, 0, BackendType::Flat),
            Err(ShardError::Configuration(_))
        ));
        assert!(matches!(
            ShardManager::new(0, 2, 3, BackendType::Flat),
            Err(ShardError::Configuration(_))
        ));
    }

    #[test]
    fn test_spills_into_next_device() {
        let mut shards = manager(3, 3);
        let range = shards.add(&batch(4, 2)).unwrap();
        assert_eq!(range, 0..4);
        assert_eq!(shards.device_occupancy(), &[3, 1, 0]);
    }

    #[test]
    fn test_fills_partial_device_before_moving_on() {
        let mut shards = manager(3, 3);
        shards.add(&batch(1, 2)).unwrap();
        shards.add(&batch(1, 2)).unwrap();
        assert_eq!(shards.device_occupancy(), &[2, 0, 0]);

        let range = shards.add(&batch(5, 2)).unwrap();
        assert_eq!(range, 2..7);
        assert_eq!(shards.device_occupancy(), &[3, 3, 1]);
    }

    #[test]
    fn test_capacity_ceiling() {
        let mut shards = manager(2, 3);
        shards.add(&batch(6, 2)).unwrap();
        assert_eq!(shards.device_occupancy(), &[3, 3]);

        let err = shards.add(&batch(1, 2)).unwrap_err();
        assert!(matches!(
            err,
            ShardError::CapacityExceeded { requested: 1, available: 0 }
        ));
        assert_eq!(shards.len(), 6);
    }

    #[test]
    fn test_oversized_batch_leaves_devices_untouched() {
        let mut shards = manager(2, 3);
        shards.add(&batch(2, 2)).unwrap();
        assert!(shards.add(&batch(5, 2)).is_err());
        assert_eq!(shards.device_occupancy(), &[2, 0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut shards = manager(2, 3);
        let err = shards.add(&batch(1, 3)).unwrap_err();
        assert!(matches!(
            err,
            ShardError::DimensionMismatch { expected: 2, got: 3 }
        ));
        assert!(shards.is_empty());
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut shards = manager(2, 3);
        let range = shards.add(&VectorBatch::empty(2).unwrap()).unwrap();
        assert!(range.is_empty());
        assert!(shards.is_empty());
    }

    #[test]
    fn test_offsets_and_locate() {
        let mut shards = manager(3, 3);
        shards.add(&batch(7, 2)).unwrap();

        assert_eq!(shards.device_offsets(), vec![0, 3, 6]);
        assert_eq!(shards.locate(0), Some((0, 0)));
        assert_eq!(shards.locate(4), Some((1, 1)));
        assert_eq!(shards.locate(6), Some((2, 0)));
        assert_eq!(shards.locate(7), None);
    }
}
