use digit_mlp::tensor::*;
use digit_mlp::Error;

#[test]
fn test_from_vec() {
    let tensor1 = Tensor::from(vec![vec![0, 1, 2], vec![3, 4, 5]]);
    let tensor2 = Tensor::new((0..6).collect(), vec![2, 3]);
    assert_eq!(tensor1, tensor2);
}

#[test]
fn test_from_nested_arrays() {
    let tensor = Tensor::from([[[1, 2], [3, 4]], [[5, 6], [7, 8]]]);
    assert_eq!(tensor.shape(), &[2, 2, 2]);
    assert_eq!(*tensor.get(&[1, 0, 1]).unwrap(), 6);
}

#[test]
fn test_get_2x2x2() {
    let matrix = Tensor::new(vec![0, 1, 2, 3, 4, 5, 6, 7], vec![2, 2, 2]);
    assert_eq!(*matrix.get(&[0, 0, 0]).unwrap(), 0);
    assert_eq!(*matrix.get(&[0, 1, 0]).unwrap(), 2);
    assert_eq!(*matrix.get(&[1, 1, 1]).unwrap(), 7);
}

#[test]
fn test_get_3x3() {
    let matrix = Tensor::new(vec![0, 1, 2, 3, 4, 5, 6, 7, 8], vec![3, 3]);
    let mut prev = -1;
    for i in 0..3 {
        for j in 0..3 {
            let curr = matrix[[i, j]];
            assert_eq!(prev + 1, curr);
            prev = curr;
        }
    }
}

#[test]
#[should_panic]
fn test_new_panics_on_bad_count() {
    Tensor::new(vec![1, 2, 3], vec![2, 2]);
}

#[test]
fn test_matmul_2x2() {
    let matrix = Tensor::new(vec![0, 1, 2, 3], vec![2, 2]);
    let shape = vec![2, 1];
    let e1 = Tensor::new(vec![0, 1], vec![2, 1]);
    let e2 = Tensor::new(vec![1, 0], vec![2, 1]);

    assert_eq!(matrix.matmul(&e1).unwrap(), Tensor::new(vec![1, 3], shape.clone()));
    assert_eq!(matrix.matmul(&e2).unwrap(), Tensor::new(vec![0, 2], shape));
}

#[test]
fn test_matmul_batch_of_64() {
    let batch = Tensor::new_with_filler(vec![64, 784], 1.0f32);
    let weights = Tensor::new_with_filler(vec![784, 128], 0.5f32);
    let result = batch.matmul(&weights).unwrap();
    assert_eq!(result.shape(), &[64, 128]);
    assert!(result.as_slice().iter().all(|&x| x == 392.0));
}

#[test]
fn test_matmul_reports_both_shapes() {
    let left = Tensor::<f32>::zeros(vec![64, 783]);
    let right = Tensor::<f32>::zeros(vec![784, 128]);
    match left.matmul(&right) {
        Err(Error::ShapeMismatch { left, right, .. }) => {
            assert_eq!(left, vec![64, 783]);
            assert_eq!(right, vec![784, 128]);
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
}

#[test]
fn test_add_same_shape() {
    let a = Tensor::from([[1, 2], [3, 4]]);
    let b = Tensor::from([[10, 20], [30, 40]]);
    assert_eq!(&a + &b, Tensor::from([[11, 22], [33, 44]]));
}

#[test]
#[should_panic]
fn test_add_different_shapes_panics() {
    let a = Tensor::from([[1, 2], [3, 4]]);
    let b = Tensor::from([1, 2, 3]);
    let _ = &a + &b;
}

#[test]
fn test_sum_and_map() {
    let tensor = Tensor::from([[1.0, -2.0], [3.0, -4.0]]);
    assert_eq!(tensor.sum(), -2.0);
    assert_eq!(tensor.map(|x: f64| x.abs()).sum(), 10.0);
}
