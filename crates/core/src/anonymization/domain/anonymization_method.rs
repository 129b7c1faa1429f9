use std::fmt;

use crate::shared::constants::{DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_PIXEL_BLOCKS};
use crate::shared::error::ConfigurationError;

/// Names accepted by [`AnonymizationMethod::parse`].
pub const METHOD_NAMES: [&str; 3] = ["blur", "pixelate", "black"];

/// How a padded face region is rewritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnonymizationMethod {
    /// Gaussian smoothing with an odd kernel size.
    Blur { kernel_size: usize },
    /// Downscale to a `blocks` × `blocks` grid, then scale back up.
    Pixelate { blocks: usize },
    /// Solid zero fill.
    Black,
}

impl AnonymizationMethod {
    /// Parses a method name with its parameters, rejecting unknown names and
    /// invalid parameters. Parameters of other methods are ignored.
    pub fn parse(
        name: &str,
        kernel_size: usize,
        blocks: usize,
    ) -> Result<Self, ConfigurationError> {
        let method = match name {
            "blur" => Self::Blur { kernel_size },
            "pixelate" => Self::Pixelate { blocks },
            "black" => Self::Black,
            _ => {
                return Err(ConfigurationError::UnknownMethod {
                    name: name.to_string(),
                    valid: METHOD_NAMES.to_vec(),
                })
            }
        };
        method.validate()?;
        Ok(method)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::Blur { kernel_size } if kernel_size == 0 || kernel_size % 2 == 0 => {
                Err(ConfigurationError::InvalidKernelSize(kernel_size))
            }
            Self::Pixelate { blocks: 0 } => Err(ConfigurationError::InvalidBlockCount(0)),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Blur { .. } => "blur",
            Self::Pixelate { .. } => "pixelate",
            Self::Black => "black",
        }
    }
}

impl Default for AnonymizationMethod {
    fn default() -> Self {
        Self::Blur {
            kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
        }
    }
}

impl std::str::FromStr for AnonymizationMethod {
    type Err = ConfigurationError;

    /// Parses a method name using default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_PIXEL_BLOCKS)
    }
}

impl fmt::Display for AnonymizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("blur", AnonymizationMethod::Blur { kernel_size: 99 })]
    #[case("pixelate", AnonymizationMethod::Pixelate { blocks: 10 })]
    #[case("black", AnonymizationMethod::Black)]
    fn test_from_str_uses_defaults(#[case] name: &str, #[case] expected: AnonymizationMethod) {
        let method: AnonymizationMethod = name.parse().unwrap();
        assert_eq!(method, expected);
        assert_eq!(method.name(), name);
        assert_eq!(method.to_string(), name);
    }

    #[test]
    fn test_unknown_method_lists_valid_names() {
        let err = "sepia".parse::<AnonymizationMethod>().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownMethod {
                name: "sepia".into(),
                valid: vec!["blur", "pixelate", "black"],
            }
        );
    }

    #[test]
    fn test_method_names_are_case_sensitive() {
        assert!("Blur".parse::<AnonymizationMethod>().is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(100)]
    fn test_even_or_zero_kernel_rejected(#[case] kernel_size: usize) {
        assert_eq!(
            AnonymizationMethod::parse("blur", kernel_size, 10),
            Err(ConfigurationError::InvalidKernelSize(kernel_size))
        );
    }

    #[test]
    fn test_zero_blocks_rejected() {
        assert_eq!(
            AnonymizationMethod::parse("pixelate", 99, 0),
            Err(ConfigurationError::InvalidBlockCount(0))
        );
    }

    #[test]
    fn test_parameters_of_other_methods_ignored() {
        assert_eq!(
            AnonymizationMethod::parse("black", 0, 0),
            Ok(AnonymizationMethod::Black)
        );
        assert_eq!(
            AnonymizationMethod::parse("blur", 5, 0),
            Ok(AnonymizationMethod::Blur { kernel_size: 5 })
        );
    }

    #[test]
    fn test_default_is_blur_99() {
        assert_eq!(
            AnonymizationMethod::default(),
            AnonymizationMethod::Blur { kernel_size: 99 }
        );
    }
}
