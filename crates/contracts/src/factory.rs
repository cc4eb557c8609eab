use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier as _},
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};

/// Everything needed to deploy a compiled contract: its ABI (for the
/// constructor signature) and its creation bytecode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractFactory {
    name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("constructor of {contract} takes {expected} arguments but {actual} were given")]
    ArgumentCount {
        contract: String,
        expected: usize,
        actual: usize,
    },
    #[error("constructor argument {index} ({name}) of {contract} expects {expected} but got {value:?}")]
    Type {
        contract: String,
        index: usize,
        name: String,
        expected: String,
        value: DynSolValue,
    },
    #[error("constructor argument {index} ({name}) of {contract} does not fit into {expected}")]
    Overflow {
        contract: String,
        index: usize,
        name: String,
        expected: String,
    },
    #[error("unsupported constructor parameter type in {contract}")]
    Abi {
        contract: String,
        #[source]
        source: alloy::dyn_abi::Error,
    },
}

impl ContractFactory {
    pub fn new(name: impl Into<String>, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Parameters of the constructor. Contracts without an explicit
    /// constructor take no arguments.
    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor
            .as_ref()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default()
    }

    /// Builds the init code of a deployment transaction: the creation
    /// bytecode followed by the ABI encoded constructor arguments.
    ///
    /// Arguments are checked against the constructor signature. Unsigned
    /// integers are narrowed to the declared width (e.g. `uint8`) if the value
    /// fits.
    pub fn deploy_code(&self, args: &[DynSolValue]) -> Result<Bytes, EncodeError> {
        let inputs = self.constructor_inputs();
        if inputs.len() != args.len() {
            return Err(EncodeError::ArgumentCount {
                contract: self.name.clone(),
                expected: inputs.len(),
                actual: args.len(),
            });
        }

        let values = inputs
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (param, value))| self.coerce(index, param, value))
            .collect::<Result<Vec<_>, _>>()?;

        let mut code = self.bytecode.to_vec();
        if !values.is_empty() {
            code.extend(DynSolValue::Tuple(values).abi_encode_params());
        }
        Ok(code.into())
    }

    fn coerce(
        &self,
        index: usize,
        param: &Param,
        value: &DynSolValue,
    ) -> Result<DynSolValue, EncodeError> {
        let ty: DynSolType = param.resolve().map_err(|source| EncodeError::Abi {
            contract: self.name.clone(),
            source,
        })?;

        let value = match (&ty, value) {
            (DynSolType::Uint(bits), DynSolValue::Uint(amount, _)) => {
                if amount.bit_len() > *bits {
                    return Err(EncodeError::Overflow {
                        contract: self.name.clone(),
                        index,
                        name: param.name.clone(),
                        expected: ty.sol_type_name().into_owned(),
                    });
                }
                DynSolValue::Uint(*amount, *bits)
            }
            _ => value.clone(),
        };

        if !ty.matches(&value) {
            return Err(EncodeError::Type {
                contract: self.name.clone(),
                index,
                name: param.name.clone(),
                expected: ty.sol_type_name().into_owned(),
                value,
            });
        }
        Ok(value)
    }
}
