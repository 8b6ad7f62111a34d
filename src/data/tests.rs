// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;

fn map_bytes(bytes: &[u8]) -> Arc<Mmap> {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    Arc::new(unsafe { Mmap::map(&file) }.unwrap())
}

#[test]
fn test_pixel_type_from_header() {
    assert_eq!(PixelType::from_header(8, 1.0, 0.0), Some(PixelType::U8));
    assert_eq!(PixelType::from_header(16, 1.0, 0.0), Some(PixelType::I16));
    assert_eq!(PixelType::from_header(32, 1.0, 0.0), Some(PixelType::I32));
    assert_eq!(PixelType::from_header(64, 1.0, 0.0), Some(PixelType::I64));
    assert_eq!(PixelType::from_header(-32, 1.0, 0.0), Some(PixelType::F32));
    assert_eq!(PixelType::from_header(-64, 1.0, 0.0), Some(PixelType::F64));

    assert_eq!(PixelType::from_header(8, 1.0, -128.0), Some(PixelType::I8));
    assert_eq!(PixelType::from_header(16, 1.0, 32768.0), Some(PixelType::U16));
    assert_eq!(
        PixelType::from_header(32, 1.0, 2147483648.0),
        Some(PixelType::U32)
    );

    // Any other scaling gives floats.
    assert_eq!(PixelType::from_header(16, 2.0, 0.0), Some(PixelType::F32));
    assert_eq!(PixelType::from_header(8, 1.0, 5.0), Some(PixelType::F32));
    assert_eq!(PixelType::from_header(32, 0.5, 0.0), Some(PixelType::F64));
    assert_eq!(PixelType::from_header(-32, 2.0, 1.0), Some(PixelType::F64));

    assert_eq!(PixelType::from_header(12, 1.0, 0.0), None);
}

#[test]
fn test_pixel_type_sizes() {
    assert_eq!(PixelType::U16.bitpix(), 16);
    assert_eq!(PixelType::I8.bytes_per_pixel(), 1);
    assert_eq!(PixelType::F32.bytes_per_pixel(), 4);
    assert_eq!(PixelType::F64.bytes_per_pixel(), 8);
}

#[test]
fn test_image_array() {
    let image: ImageArray = Array2::<i16>::zeros((3, 4)).into_dyn().into();
    assert_eq!(image.shape(), &[3, 4]);
    assert_eq!(image.len(), 12);
    assert!(!image.is_empty());
    assert_eq!(image.pixel_type(), PixelType::I16);

    let image: ImageArray = array![[1.5f32, 2.0], [3.0, -4.0]].into_dyn().into();
    assert_abs_diff_eq!(
        image.to_f64(),
        array![[1.5, 2.0], [3.0, -4.0]].into_dyn()
    );
}

#[test]
fn test_mapped_image() {
    // 2x3 big-endian i16, with a few padding bytes either side.
    let values: [i16; 6] = [1, -2, 300, 4, 5, -32768];
    let mut bytes = vec![0xff; 4];
    for v in values {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes.extend_from_slice(&[0xff; 4]);
    let map = map_bytes(&bytes);

    let image = MappedImage::new(map, 4, PixelType::I16, vec![2, 3]).unwrap();
    assert_eq!(image.shape(), &[2, 3]);
    assert_eq!(image.as_bytes().len(), 12);
    assert_eq!(image.get(&[0, 0]), Some(1.0));
    assert_eq!(image.get(&[0, 2]), Some(300.0));
    assert_eq!(image.get(&[1, 2]), Some(-32768.0));
    assert_eq!(image.get(&[2, 0]), None);
    assert_eq!(image.get(&[0]), None);

    assert_eq!(
        image.to_array(),
        ImageArray::I16(array![[1, -2, 300], [4, 5, -32768]].into_dyn())
    );
}

#[test]
fn test_mapped_float_image() {
    let values: [f64; 3] = [0.25, -1e300, f64::INFINITY];
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    let map = map_bytes(&bytes);

    let image = MappedImage::new(map, 0, PixelType::F64, vec![3]).unwrap();
    assert_eq!(image.get(&[1]), Some(-1e300));
    match image.to_array() {
        ImageArray::F64(a) => assert_eq!(a.as_slice().unwrap(), &values),
        other => panic!("unexpected {:?}", other.pixel_type()),
    }
}

#[test]
fn test_mapped_region_bounds() {
    let map = map_bytes(&[0; 16]);
    assert!(MappedRegion::new(Arc::clone(&map), 8, 8).is_some());
    assert!(MappedRegion::new(Arc::clone(&map), 8, 9).is_none());
    assert!(MappedImage::new(map, 0, PixelType::F32, vec![5]).is_none());
}

#[test]
fn test_map_outlives_reader() {
    let map = map_bytes(&[1, 2, 3, 4]);
    let region = MappedRegion::new(Arc::clone(&map), 1, 2).unwrap();
    drop(map);
    assert_eq!(region.as_bytes(), &[2, 3]);
}

#[test]
fn test_hdu_data() {
    let empty = HduData::Empty;
    assert!(!empty.is_memory_mapped());
    assert!(empty.shape().is_empty());
    assert!(empty.as_image().is_none());

    let table = HduData::Table(TableData {
        num_rows: 2,
        row_len: 3,
        bytes: ByteStorage::Owned(vec![1, 2, 3, 4, 5, 6]),
    });
    assert!(!table.is_memory_mapped());
    assert_eq!(table.shape(), vec![2, 3]);
    let t = table.as_table().unwrap();
    assert_eq!(t.row(1), Some(&[4, 5, 6][..]));
    assert_eq!(t.row(2), None);

    let map = map_bytes(&[0; 8]);
    let mapped = HduData::Image(ImageData::Mapped(
        MappedImage::new(map, 0, PixelType::U8, vec![2, 4]).unwrap(),
    ));
    assert!(mapped.is_memory_mapped());
    assert_eq!(mapped.shape(), vec![2, 4]);
    assert_eq!(
        mapped.as_image().unwrap().to_array(),
        ImageArray::U8(Array2::zeros((2, 4)).into_dyn())
    );
}
