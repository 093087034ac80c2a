//! Scatter aggregation over a target index.
//!
//! The message-passing layers reduce per-edge values into per-node buckets
//! with these helpers. Sum and mean stay on-device through `index_add`; max
//! and softmax have no sparse candle kernel and are computed host-side.

use crate::{Error, Result};
use candle_core::{DType, Tensor};

/// How scattered values are combined per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Sum of all values per target.
    Sum,
    /// Arithmetic mean per target (empty targets stay 0).
    Mean,
    /// Element-wise maximum per target (empty targets stay 0).
    Max,
    /// Per-source softmax within each target group; output keeps the source
    /// length rather than the target count.
    Softmax,
}

/// Scatter `src` rows into `num_targets` buckets selected by `index`.
///
/// `src` is `(E,)` or `(E, F)`, `index` is `(E,)` u32. For `Sum`/`Mean`/`Max`
/// the result is `(T,)` or `(T, F)` with `T = num_targets` (default
/// `index.max() + 1`); for `Softmax` it is the same shape as `src`.
pub fn scatter(
    src: &Tensor,
    index: &Tensor,
    num_targets: Option<usize>,
    aggr: Aggregation,
) -> Result<Tensor> {
    if index.rank() != 1 || index.dtype() != DType::U32 {
        return Err(Error::InvalidConfig(format!(
            "scatter index must be a 1-D u32 tensor, got {:?} {:?}",
            index.dims(),
            index.dtype()
        )));
    }
    let num_src = index.dim(0)?;
    if src.dim(0)? != num_src {
        return Err(Error::ShapeMismatch {
            attribute: "scatter src".to_string(),
            expected: num_src,
            got: src.dim(0)?,
        });
    }

    let was_1d = src.rank() == 1;
    let src = if was_1d { src.unsqueeze(1)? } else { src.clone() };
    if src.rank() != 2 {
        return Err(Error::InvalidConfig(format!(
            "scatter src must be 1-D or 2-D, got {:?}",
            src.dims()
        )));
    }
    let features = src.dim(1)?;

    let max_index = if num_src > 0 {
        index.max(0)?.to_scalar::<u32>()? as usize
    } else {
        0
    };
    let targets = num_targets.unwrap_or(if num_src > 0 { max_index + 1 } else { 0 });
    if num_src > 0 && max_index >= targets && aggr != Aggregation::Softmax {
        return Err(Error::InvalidConfig(format!(
            "scatter index {max_index} out of range for {targets} targets"
        )));
    }

    let out = match aggr {
        Aggregation::Sum => {
            Tensor::zeros((targets, features), src.dtype(), src.device())?
                .index_add(index, &src, 0)?
        }
        Aggregation::Mean => {
            let src = if src.dtype().is_float() {
                src.clone()
            } else {
                src.to_dtype(DType::F32)?
            };
            let sums = Tensor::zeros((targets, features), src.dtype(), src.device())?
                .index_add(index, &src, 0)?;
            let ones = Tensor::ones((num_src, 1), src.dtype(), src.device())?;
            let counts = Tensor::zeros((targets, 1), src.dtype(), src.device())?
                .index_add(index, &ones, 0)?
                .maximum(1f64)?;
            sums.broadcast_div(&counts)?
        }
        Aggregation::Max => scatter_max(&src, index, targets, features)?,
        Aggregation::Softmax => scatter_softmax(&src, index, features)?,
    };

    if was_1d {
        Ok(out.squeeze(1)?)
    } else {
        Ok(out)
    }
}

fn scatter_max(src: &Tensor, index: &Tensor, targets: usize, features: usize) -> Result<Tensor> {
    let dtype = src.dtype();
    let vals = src.to_dtype(DType::F32)?.to_vec2::<f32>()?;
    let idx = index.to_vec1::<u32>()?;

    let mut out = vec![f32::NEG_INFINITY; targets * features];
    for (row, &t) in vals.iter().zip(idx.iter()) {
        let base = t as usize * features;
        for (j, &v) in row.iter().enumerate() {
            if v > out[base + j] {
                out[base + j] = v;
            }
        }
    }
    for v in &mut out {
        if *v == f32::NEG_INFINITY {
            *v = 0.0;
        }
    }

    Ok(Tensor::from_vec(out, (targets, features), src.device())?.to_dtype(dtype)?)
}

fn scatter_softmax(src: &Tensor, index: &Tensor, features: usize) -> Result<Tensor> {
    let vals = src.to_dtype(DType::F32)?.to_vec2::<f32>()?;
    let idx = index.to_vec1::<u32>()?;
    let groups = idx.iter().map(|&t| t as usize + 1).max().unwrap_or(0);

    let mut group_max = vec![f32::NEG_INFINITY; groups * features];
    for (row, &t) in vals.iter().zip(idx.iter()) {
        let base = t as usize * features;
        for (j, &v) in row.iter().enumerate() {
            if v > group_max[base + j] {
                group_max[base + j] = v;
            }
        }
    }

    let mut exps = vec![0f32; vals.len() * features];
    let mut group_sum = vec![0f32; groups * features];
    for (i, (row, &t)) in vals.iter().zip(idx.iter()).enumerate() {
        let base = t as usize * features;
        for (j, &v) in row.iter().enumerate() {
            let e = (v - group_max[base + j]).exp();
            exps[i * features + j] = e;
            group_sum[base + j] += e;
        }
    }
    for (i, &t) in idx.iter().enumerate() {
        let base = t as usize * features;
        for j in 0..features {
            exps[i * features + j] /= group_sum[base + j];
        }
    }

    Ok(Tensor::from_vec(exps, (vals.len(), features), src.device())?)
}

/// In-degree of each node under `index`, as an `(num_nodes,)` f32 tensor.
pub fn degree(index: &Tensor, num_nodes: usize) -> Result<Tensor> {
    let num_src = index.dim(0)?;
    let ones = Tensor::ones((num_src, 1), DType::F32, index.device())?;
    let counts = Tensor::zeros((num_nodes, 1), DType::F32, index.device())?
        .index_add(index, &ones, 0)?;
    Ok(counts.squeeze(1)?)
}

/// Append one self-loop edge per node to a `(2, E)` edge index.
pub fn add_self_loops(edge_index: &Tensor, num_nodes: usize) -> Result<Tensor> {
    let nodes = Tensor::arange(0u32, num_nodes as u32, edge_index.device())?;
    let loops = Tensor::stack(&[&nodes, &nodes], 0)?;
    Ok(Tensor::cat(&[edge_index, &loops], 1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_scatter_1d() {
        let device = Device::Cpu;
        let src = Tensor::new(&[1f32, 1., 1., 1.], &device).unwrap();
        let index = Tensor::new(&[0u32, 0, 1, 2], &device).unwrap();

        let softmax = scatter(&src, &index, None, Aggregation::Softmax).unwrap();
        assert_eq!(softmax.to_vec1::<f32>().unwrap(), vec![0.5, 0.5, 1., 1.]);

        let sum = scatter(&src, &index, Some(3), Aggregation::Sum).unwrap();
        assert_eq!(sum.to_vec1::<f32>().unwrap(), vec![2., 1., 1.]);

        let max = scatter(&src, &index, Some(3), Aggregation::Max).unwrap();
        assert_eq!(max.to_vec1::<f32>().unwrap(), vec![1., 1., 1.]);
    }

    #[test]
    fn test_scatter_2d() {
        let device = Device::Cpu;
        let src = Tensor::new(&[[1f32, 2.], [1., 3.], [1., 4.], [1., 5.]], &device).unwrap();
        let index = Tensor::new(&[0u32, 0, 1, 2], &device).unwrap();

        let sum = scatter(&src, &index, Some(3), Aggregation::Sum).unwrap();
        assert_eq!(
            sum.to_vec2::<f32>().unwrap(),
            vec![vec![2., 5.], vec![1., 4.], vec![1., 5.]]
        );

        let max = scatter(&src, &index, Some(3), Aggregation::Max).unwrap();
        assert_eq!(
            max.to_vec2::<f32>().unwrap(),
            vec![vec![1., 3.], vec![1., 4.], vec![1., 5.]]
        );

        let softmax = scatter(&src, &index, None, Aggregation::Softmax).unwrap();
        let rows = softmax.to_vec2::<f32>().unwrap();
        let expect = [[0.5, 0.269], [0.5, 0.731], [1., 1.], [1., 1.]];
        for (row, want) in rows.iter().zip(expect.iter()) {
            for (got, want) in row.iter().zip(want.iter()) {
                assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
            }
        }
    }

    #[test]
    fn test_scatter_mean() {
        let device = Device::Cpu;
        let src = Tensor::new(&[[2f32, 4.], [4., 8.], [6., 6.]], &device).unwrap();
        let index = Tensor::new(&[0u32, 0, 2], &device).unwrap();

        let mean = scatter(&src, &index, Some(3), Aggregation::Mean).unwrap();
        assert_eq!(
            mean.to_vec2::<f32>().unwrap(),
            vec![vec![3., 6.], vec![0., 0.], vec![6., 6.]]
        );
    }

    #[test]
    fn test_scatter_index_out_of_range() {
        let device = Device::Cpu;
        let src = Tensor::new(&[1f32, 1.], &device).unwrap();
        let index = Tensor::new(&[0u32, 5], &device).unwrap();
        let err = scatter(&src, &index, Some(3), Aggregation::Sum).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_degree() {
        let device = Device::Cpu;
        let index = Tensor::new(&[0u32, 0, 1], &device).unwrap();
        let deg = degree(&index, 3).unwrap();
        assert_eq!(deg.to_vec1::<f32>().unwrap(), vec![2., 1., 0.]);
    }

    #[test]
    fn test_add_self_loops() {
        let device = Device::Cpu;
        let ei = Tensor::new(&[[0u32, 1], [1, 2]], &device).unwrap();
        let with_loops = add_self_loops(&ei, 3).unwrap();
        let rows = with_loops.to_vec2::<u32>().unwrap();
        assert_eq!(rows[0], vec![0, 1, 0, 1, 2]);
        assert_eq!(rows[1], vec![1, 2, 0, 1, 2]);
    }
}
