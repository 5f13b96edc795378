use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

use crate::pipelines::text_classification::SparseVector;

/// Stack sparse rows into a dense `[batch_size, dim]` tensor
pub fn densify<B: Backend>(
    rows: &[&SparseVector],
    dim: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch_size = rows.len();

    let mut values = vec![0.0f32; batch_size * dim];
    for (index, row) in rows.iter().enumerate() {
        row.scatter_into(&mut values[index * dim..(index + 1) * dim]);
    }

    let data: Data<B::FloatElem, 2> = Data::new(
        values.into_iter().map(|v| v.elem()).collect(),
        Shape::new([batch_size, dim]),
    );

    Tensor::from_data(data, device)
}

/// Class keys as a 1D integer tensor
pub fn targets<B: Backend>(keys: &[u32], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Data<B::IntElem, 1> = Data::new(
        keys.iter().map(|key| (*key as i64).elem()).collect(),
        Shape::new([keys.len()]),
    );

    Tensor::from_data(data, device)
}
