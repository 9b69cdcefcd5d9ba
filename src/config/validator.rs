//! Configuration validation

use super::*;
use crate::util::AlignedBuffer;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.device.as_os_str().is_empty() {
        anyhow::bail!("device path must not be empty");
    }

    validate_matrix(&config.matrix)?;

    if let Some(alignment) = config.alignment {
        validate_alignment(alignment)?;
    }

    Ok(())
}

/// Validate the size and increment lists
pub fn validate_matrix(matrix: &TestMatrix) -> Result<()> {
    if matrix.is_empty() {
        anyhow::bail!("test matrix is empty: need at least one read size, write size and increment");
    }

    for &size in matrix.read_sizes.iter().chain(matrix.write_sizes.iter()) {
        if size == 0 {
            anyhow::bail!("transfer sizes must be greater than 0");
        }
        if usize::try_from(size).is_err() {
            anyhow::bail!("transfer size {} does not fit in memory on this platform", size);
        }
    }

    for &increment in &matrix.increments {
        if increment == 0 {
            anyhow::bail!("jump increments must be greater than 0");
        }
        if i64::try_from(increment).is_err() {
            anyhow::bail!("jump increment {} exceeds the largest seekable offset", increment);
        }
    }

    Ok(())
}

/// Validate a buffer alignment override
pub fn validate_alignment(alignment: usize) -> Result<()> {
    if !alignment.is_power_of_two() {
        anyhow::bail!("alignment must be a power of two, got {}", alignment);
    }
    if alignment < AlignedBuffer::MIN_ALIGNMENT {
        anyhow::bail!("alignment must be at least {}, got {}", AlignedBuffer::MIN_ALIGNMENT, alignment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RunConfig::new("/dev/sdb")).is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut config = RunConfig::new("/dev/sdb");
        config.matrix.write_sizes = vec![4096, 0];
        assert!(validate_config(&config).is_err());

        let mut config = RunConfig::new("/dev/sdb");
        config.matrix.increments = vec![0];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("jump increments"));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let mut config = RunConfig::new("/dev/sdb");
        config.matrix.read_sizes.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_huge_increment_rejected() {
        let mut config = RunConfig::new("/dev/sdb");
        config.matrix.increments = vec![u64::MAX];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_alignment() {
        assert!(validate_alignment(512).is_ok());
        assert!(validate_alignment(4096).is_ok());
        assert!(validate_alignment(3000).is_err());
        assert!(validate_alignment(1).is_err());

        let mut config = RunConfig::new("/dev/sdb");
        config.alignment = Some(1000);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_device_rejected() {
        assert!(validate_config(&RunConfig::new("")).is_err());
    }
}
