use gifti::color::{ColorEntry, ColorTable};
use gifti::prelude::*;
use gifti::sparse::node_index_array;
use gifti::{emit, ingest, parse_gifti, to_string};

use std::path::PathBuf;

fn tetrahedron() -> Surface {
    Surface::from_geometry(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        &[[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]],
    )
    .unwrap()
}

fn through_xml(surface: &Surface, output: Output, options: &EmitOptions) -> Gifti {
    let gifti = emit(surface, output, options).unwrap();
    let text = to_string(&gifti).unwrap();
    parse_gifti(text.as_bytes()).unwrap()
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gifti-{}-{name}", std::process::id()))
}

#[test]
fn sparse_shape_only_touches_listed_vertices() {
    let mut gifti = Gifti::new();
    gifti.push_array(node_index_array(&[1, 3]).unwrap()).unwrap();

    let mut shape =
        DataArray::allocate(Intent::Shape, ElementKind::Float32, IndexOrder::RowMajor, &[2]).unwrap();
    shape.set(0, 0, 5.0).unwrap();
    shape.set(1, 0, 7.0).unwrap();
    gifti.push_array(shape).unwrap();

    let mut surface = tetrahedron();
    surface.vertices[0].curv = -1.0;

    let surface = ingest(&gifti, Some(surface), &mut ReadOptions::default()).unwrap();

    let curv: Vec<f32> = surface.vertices.iter().map(|v| v.curv).collect();
    assert_eq!(curv, vec![-1.0, 5.0, 0.0, 7.0]);
}

#[test]
fn sparse_emission_round_trip() {
    let mut surface = tetrahedron();
    for (index, vertex) in surface.vertices.iter_mut().enumerate() {
        vertex.curv = index as f32 * 10.0;
    }

    let options = EmitOptions::default().with_node_index(vec![2, 0]);
    let output = Output::Shape {
        source: ScalarSource::Curvature,
    };
    let gifti = through_xml(&surface, output, &options);

    assert_eq!(gifti.arrays[0].intent, Intent::NodeIndex);
    assert_eq!(gifti.arrays[1].rows(), 2);

    let target = tetrahedron();
    let read = ingest(&gifti, Some(target), &mut ReadOptions::default()).unwrap();

    let curv: Vec<f32> = read.vertices.iter().map(|v| v.curv).collect();
    assert_eq!(curv, vec![0.0, 0.0, 20.0, 0.0]);
}

#[test]
fn label_round_trip_keeps_table_indices() {
    let entries = vec![
        Some(ColorEntry::new("unknown", 25, 5, 25, 0)),
        Some(ColorEntry::new("A", 255, 0, 0, 255)),
        Some(ColorEntry::new("B", 0, 255, 0, 255)),
    ];
    let table = ColorTable::from_entries(entries);

    let mut surface = tetrahedron();
    let indices = [0usize, 1, 2, 1];
    for (vertex, index) in surface.vertices.iter_mut().zip(indices) {
        vertex.annotation = table.entry(index).unwrap().annotation();
    }
    surface.color_table = Some(table);

    let gifti = through_xml(&surface, Output::Label, &EmitOptions::default());

    let unknown = gifti.labels.iter().next().unwrap();
    assert_eq!(unknown.name, "unknown");
    assert_eq!(unknown.color, Some([0.0, 0.0, 0.0, 0.0]));

    let read = ingest(&gifti, Some(tetrahedron()), &mut ReadOptions::default()).unwrap();
    let read_table = read.color_table.as_ref().unwrap();

    for (vertex, index) in read.vertices.iter().zip(indices) {
        assert_eq!(read_table.find_annotation(vertex.annotation), Some(index));
    }
}

#[test]
fn labels_need_a_color_table() {
    let surface = tetrahedron();
    let err = emit(&surface, Output::Label, &EmitOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingColorTable(_)));
}

#[test]
fn combined_overlays_fill_frames() {
    let surface = tetrahedron();
    let thickness = OverlayVolume::from_frame(&[1.0, 2.0, 3.0, 4.0]);
    let tstat = OverlayVolume::from_frame(&[0.5, -0.5, 1.5, -1.5]);

    let output = Output::Combined {
        overlays: vec![
            OverlaySelection::new(Intent::Shape, &thickness).with_name("thickness"),
            OverlaySelection::new(Intent::Stat(StatIntent::TTest), &tstat),
        ],
    };
    let gifti = through_xml(&surface, output, &EmitOptions::default());

    assert_eq!(gifti.arrays.len(), 4);
    assert_eq!(gifti.arrays[2].name(), Some("thickness"));

    let mut sink = OverlayVolume::new(4);
    let mut options = ReadOptions::default().with_overlay(&mut sink);
    let read = ingest(&gifti, None, &mut options).unwrap();

    assert_eq!(read.vertices[3].curv, 4.0);
    assert_eq!(read.vertices[1].stat, -0.5);

    assert_eq!(sink.frames(), 2);
    assert_eq!(sink.frame(0), Some(vec![1.0, 2.0, 3.0, 4.0]));
    assert_eq!(sink.frame(1), Some(vec![0.5, -0.5, 1.5, -1.5]));
}

#[test]
fn files_on_disk() {
    let surface_path = scratch_path("lh.white.gii");
    let thickness_path = scratch_path("lh.thickness.gii");

    let mut surface = tetrahedron();
    gifti::write_surface(&surface, &surface_path).unwrap();

    for (index, vertex) in surface.vertices.iter_mut().enumerate() {
        vertex.curv = 2.0 + index as f32;
    }
    let output = Output::Shape {
        source: ScalarSource::Curvature,
    };
    gifti::write_output(&surface, output, &thickness_path, EmitOptions::default()).unwrap();

    let mut read = gifti::read_surface(&surface_path).unwrap();
    assert_eq!(
        read.name.as_deref(),
        surface_path.file_name().and_then(|name| name.to_str())
    );
    assert!(read.vertices.iter().all(|v| v.curv == 0.0));

    gifti::read_overlay_into(&mut read, &thickness_path, &mut ReadOptions::default()).unwrap();
    assert_eq!(read.vertices[3].curv, 5.0);

    let container = gifti::read_gifti(&thickness_path).unwrap();
    assert_eq!(
        container.arrays[0].meta.get_str("ShapeDataType"),
        Some("Thickness")
    );

    std::fs::remove_file(&surface_path).ok();
    std::fs::remove_file(&thickness_path).ok();
}

#[test]
fn time_series_file() {
    let path = scratch_path("lh.bold.gii");

    let mut volume = OverlayVolume::new(4).with_time_step(2.0);
    for frame in 0..5 {
        for vertex in 0..4 {
            volume
                .set_value(vertex, frame, (vertex * 100 + frame) as f32)
                .unwrap();
        }
    }
    gifti::write_volume(&volume, &path, &EmitOptions::default()).unwrap();

    let container = gifti::read_gifti(&path).unwrap();
    assert_eq!(gifti::count_scalar_arrays(&container), 5);

    let header = gifti::read_overlay_header(&path).unwrap();
    assert_eq!((header.vertices, header.frames), (4, 5));
    assert_eq!(header.time_step, 2.0);

    let read = gifti::read_overlay_volume(&path).unwrap();
    assert_eq!(read.values(), volume.values());

    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_file() {
    let err = gifti::read_surface(scratch_path("does-not-exist.gii")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
