//! Per-vertex face incidence

use super::Surface;
use crate::Error;

impl Surface {
    /// Derive, for every vertex, the faces it is a corner of and its corner
    /// slot in each of them. Existing incidence lists are replaced.
    ///
    /// Fails if a face references a vertex that does not exist.
    pub fn build_topology(&mut self) -> Result<(), Error> {
        let num_vertices = self.vertices.len();

        let mut degree = Vec::new();
        degree.try_reserve_exact(num_vertices)?;
        degree.resize(num_vertices, 0usize);

        for (index, face) in self.faces.iter().enumerate() {
            for vertex in face.vertices {
                match degree.get_mut(vertex) {
                    Some(count) => *count += 1,
                    None => {
                        return Err(Error::MalformedDataArray(format!(
                            "face {index} references vertex {vertex}, the surface has {num_vertices} vertices"
                        )))
                    }
                }
            }
        }

        for (vertex, count) in self.vertices.iter_mut().zip(&degree) {
            vertex.faces.clear();
            vertex.slots.clear();
            vertex.faces.try_reserve_exact(*count)?;
            vertex.slots.try_reserve_exact(*count)?;
        }

        for (index, face) in self.faces.iter().enumerate() {
            for (slot, vertex) in face.vertices.iter().enumerate() {
                let vertex = &mut self.vertices[*vertex];
                vertex.faces.push(index);
                vertex.slots.push(slot as u8);
            }
        }

        Ok(())
    }

    /// Verify that every vertex lists exactly the faces referencing it, each
    /// with the matching corner slot.
    pub fn check_topology(&self) -> Result<(), Error> {
        let mut referenced = vec![0usize; self.vertices.len()];

        for face in &self.faces {
            for vertex in face.vertices {
                let count = referenced.get_mut(vertex).ok_or_else(|| {
                    Error::MalformedDataArray(format!("face references missing vertex {vertex}"))
                })?;
                *count += 1;
            }
        }

        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.faces.len() != vertex.slots.len() || vertex.faces.len() != referenced[index] {
                return Err(Error::MalformedDataArray(format!(
                    "vertex {index} lists {} faces, {} faces reference it",
                    vertex.faces.len(),
                    referenced[index]
                )));
            }

            for (face, slot) in vertex.faces.iter().zip(&vertex.slots) {
                let corner = self
                    .faces
                    .get(*face)
                    .and_then(|f| f.vertices.get(*slot as usize));

                if corner != Some(&index) {
                    return Err(Error::MalformedDataArray(format!(
                        "vertex {index} claims slot {slot} of face {face}"
                    )));
                }
            }
        }

        Ok(())
    }
}
