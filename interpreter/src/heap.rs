use ir::Type;

use crate::{Pointer, Result, RuntimeError, Value};

/// Allocations made by `alloc`. Nothing is ever freed.
#[derive(Debug, Default)]
pub(crate) struct Heap {
    allocations: Vec<Vec<Option<Value>>>,
}

impl Heap {
    pub fn allocate(&mut self, size: i64, pointee: Type) -> Result<Pointer> {
        let len = usize::try_from(size)
            .ok()
            .filter(|&len| len > 0)
            .ok_or(RuntimeError::BadAllocation(size))?;
        self.allocations.push(vec![Value::zero(&pointee); len]);
        Ok(Pointer {
            allocation: self.allocations.len() - 1,
            offset: 0,
            pointee,
        })
    }

    fn slot(&mut self, pointer: &Pointer) -> Result<&mut Option<Value>> {
        let allocation = &mut self.allocations[pointer.allocation];
        let size = allocation.len();
        usize::try_from(pointer.offset)
            .ok()
            .and_then(|offset| allocation.get_mut(offset))
            .ok_or(RuntimeError::OutOfBounds {
                offset: pointer.offset,
                size,
            })
    }

    pub fn load(&mut self, pointer: &Pointer) -> Result<Value> {
        self.slot(pointer)?.clone().ok_or(RuntimeError::UninitializedLoad)
    }

    pub fn store(&mut self, pointer: &Pointer, value: Value) -> Result<()> {
        let expected = pointer.pointee.clone();
        if value.ty() != expected {
            return Err(RuntimeError::TypeMismatch {
                expected,
                found: value.ty(),
            });
        }
        *self.slot(pointer)? = Some(value);
        Ok(())
    }
}
