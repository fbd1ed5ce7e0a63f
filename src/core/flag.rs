use crate::types::{FlagMask, FloeError, FloeResult};

/// Elementwise boolean AND accumulator over same-length flag arrays
///
/// The first array added fixes the record count; every later array must
/// match it. With nothing added the condition is undetermined (classifier
/// rules always add at least one comparison).
#[derive(Debug, Default)]
pub struct AndCondition {
    flag: Option<FlagMask>,
}

impl AndCondition {
    pub fn new() -> Self {
        Self { flag: None }
    }

    /// AND the given flag array into the running result
    pub fn add(&mut self, condition: FlagMask) -> FloeResult<()> {
        match &mut self.flag {
            None => {
                self.flag = Some(condition);
            }
            Some(flag) => {
                if flag.len() != condition.len() {
                    return Err(FloeError::InvalidRecordCount {
                        expected: flag.len(),
                        actual: condition.len(),
                    });
                }
                ndarray::Zip::from(flag)
                    .and(&condition)
                    .for_each(|f, &c| *f = *f && c);
            }
        }
        Ok(())
    }

    /// The accumulated flag array (None if nothing was added)
    pub fn flag(&self) -> Option<&FlagMask> {
        self.flag.as_ref()
    }

    /// Consume the condition, failing if no array was ever added
    pub fn into_flag(self) -> FloeResult<FlagMask> {
        self.flag.ok_or_else(|| {
            FloeError::InvalidConfig("AND condition evaluated without any comparison".to_string())
        })
    }
}

/// Record indices at which the mask is true
pub fn where_true(mask: &FlagMask) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &f)| f.then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_and_accumulation() {
        let mut cond = AndCondition::new();
        cond.add(array![true, true, false, true]).unwrap();
        cond.add(array![true, false, false, true]).unwrap();
        let flag = cond.into_flag().unwrap();
        assert_eq!(flag, array![true, false, false, true]);
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let mut cond = AndCondition::new();
        cond.add(array![true, true, true]).unwrap();
        let result = cond.add(array![true, true]);
        assert!(matches!(
            result,
            Err(crate::types::FloeError::InvalidRecordCount {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_where_true() {
        assert_eq!(where_true(&array![false, true, false, true]), vec![1, 3]);
    }
}
