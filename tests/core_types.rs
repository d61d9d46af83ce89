use astroconv::{ChannelGrid, ConvError, DType, DynamicArray, NdArray, Scalar};

#[test]
fn ndarray_rejects_invalid_shapes() {
    let err = NdArray::<f32>::zeros(&[0, 4]).err().unwrap();
    assert_eq!(err, ConvError::InvalidDims { dims: vec![0, 4] });

    let err = NdArray::<f32>::zeros(&[]).err().unwrap();
    assert_eq!(err, ConvError::InvalidDims { dims: vec![] });

    let err = NdArray::from_vec(vec![1.0f32; 7], &[2, 4]).err().unwrap();
    assert_eq!(
        err,
        ConvError::LengthMismatch {
            expected: 8,
            got: 7,
        }
    );
}

#[test]
fn ndarray_exposes_shape_and_elements() {
    let array = NdArray::from_vec((0u16..12).collect(), &[3, 4]).unwrap();
    assert_eq!(array.dims(), &[3, 4]);
    assert_eq!(array.ndim(), 2);
    assert_eq!(array.len(), 12);
    assert_eq!(array.dtype(), DType::Uint16);
    assert_eq!(array.get(&[2, 1]), Some(&9));
    assert_eq!(array.get(&[3, 0]), None);
    assert_eq!(array.flat_index(&[1, 3]), Some(7));
}

#[test]
fn views_share_storage_with_their_parent() {
    let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
    let array = NdArray::from_vec(data.clone(), &[4, 4]).unwrap();
    let full = array.view();
    assert_eq!(full.dims(), &[4, 4]);
    let collected: Vec<f32> = full.iter().copied().collect();
    assert_eq!(collected, data);

    let tile = array.slice(&[1, 1], &[2, 2]).unwrap();
    let runs: Vec<&[f32]> = tile.runs().collect();
    assert_eq!(runs, vec![&[5.0f32, 6.0][..], &[9.0f32, 10.0][..]]);
    assert_eq!(tile.parent_dims(), &[4, 4]);

    let err = array.slice(&[3, 3], &[2, 2]).err().unwrap();
    assert_eq!(
        err,
        ConvError::ViewOutOfBounds {
            offset: vec![3, 3],
            dims: vec![2, 2],
            parent: vec![4, 4],
        }
    );
}

#[test]
fn blank_bookkeeping_follows_mutation() {
    let mut array =
        NdArray::from_vec(vec![1.0f32, f32::NAN, 3.0, f32::NAN, 5.0, 6.0], &[2, 3]).unwrap();
    assert_eq!(array.blank_status(), None);
    assert_eq!(array.count_blank(), 2);
    assert!(array.refresh_blank_status());
    assert_eq!(array.blank_status(), Some(true));

    array.as_mut_slice()[1] = 2.0;
    assert_eq!(array.blank_status(), None, "mutation invalidates the cache");

    array.remove_blanks();
    assert_eq!(array.dims(), &[5]);
    assert_eq!(array.as_slice(), &[1.0, 2.0, 3.0, 5.0, 6.0]);
    assert_eq!(array.blank_status(), Some(false));
}

#[test]
fn integer_arrays_use_sentinel_blanks() {
    let array = NdArray::from_vec(vec![0u8, u8::MAX, 3], &[3]).unwrap();
    assert_eq!(array.count_blank(), 1);
    assert!(array.has_blank());

    let signed = NdArray::from_vec(vec![i32::MIN, -1, 0], &[3]).unwrap();
    assert_eq!(signed.count_blank(), 1);

    assert_eq!(DType::Uint8.blank().unwrap(), Scalar::Uint8(u8::MAX));
    assert_eq!(DType::Int32.blank().unwrap(), Scalar::Int32(i32::MIN));
}

#[test]
fn dtype_parsing_produces_typed_scalars() {
    assert_eq!(DType::Int16.parse("-12"), Ok(Scalar::Int16(-12)));
    assert_eq!(DType::Float32.parse("1.5"), Ok(Scalar::Float32(1.5)));
    let err = DType::Uint8.parse("70000").err().unwrap();
    assert_eq!(
        err,
        ConvError::ParseValue {
            dtype: DType::Uint8,
            value: "70000".to_string(),
        }
    );
    let err = DType::Complex64.parse("1+2i").err().unwrap();
    assert_eq!(
        err,
        ConvError::UnsupportedType {
            dtype: DType::Complex64,
            op: "value parsing",
        }
    );
}

#[test]
fn dynamic_arrays_carry_any_supported_type() {
    let mut dynamic = DynamicArray::from(NdArray::from_vec(vec![1i64, i64::MIN, 3], &[3]).unwrap());
    assert_eq!(dynamic.dtype(), DType::Int64);
    assert_eq!(dynamic.len(), 3);
    assert_eq!(dynamic.get(&[1]), Some(Scalar::Int64(i64::MIN)));
    assert_eq!(dynamic.count_blank(), 1);
    dynamic.remove_blanks();
    assert_eq!(dynamic.dims(), &[2]);

    let err = DynamicArray::zeros(DType::Bit, &[4]).err().unwrap();
    assert_eq!(
        err,
        ConvError::UnsupportedType {
            dtype: DType::Bit,
            op: "array allocation",
        }
    );
}

#[test]
fn channel_grid_validates_against_the_image_shape() {
    let grid = ChannelGrid::new(&[100, 100], &[4, 2]).unwrap();
    assert_eq!(grid.tile_dims(), &[25, 50]);
    assert_eq!(grid.channel_count(), 8);

    let err = ChannelGrid::new(&[100, 100], &[3, 2]).err().unwrap();
    assert_eq!(
        err,
        ConvError::InvalidChannels {
            axis: 0,
            extent: 100,
            channels: 3,
        }
    );
    assert_eq!(
        err.to_string(),
        "channel count 3 does not evenly divide axis 0 extent 100"
    );
}

#[test]
fn channel_slices_read_the_right_tiles() {
    let array = NdArray::from_vec((0..36i32).collect(), &[6, 6]).unwrap();
    let grid = ChannelGrid::new(&[6, 6], &[2, 3]).unwrap();
    assert_eq!(grid.tile_dims(), &[3, 2]);

    let tile = grid.channel_slice(&array, &[1, 2]).unwrap();
    let values: Vec<i32> = tile.iter().copied().collect();
    assert_eq!(values, vec![22, 23, 28, 29, 34, 35]);

    assert!(grid.same_channel(&[0, 0], &[2, 1]));
    assert!(!grid.same_channel(&[2, 1], &[3, 1]));
    assert_eq!(grid.channel_of(&[5, 3]), vec![1, 1]);
}
