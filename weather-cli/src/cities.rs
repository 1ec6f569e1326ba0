/// Cities processed on every run, in order.
pub const NIGER_CITIES: [&str; 20] = [
    "Niamey",
    "Zinder",
    "Maradi",
    "Tahoua",
    "Agadez",
    "Arlit",
    "Dosso",
    "Birni N'Konni",
    "Tessaoua",
    "Gaya",
    "Diffa",
    "Tillabéri",
    "Dogondoutchi",
    "Abalak",
    "Mayahi",
    "Gouré",
    "Dakoro",
    "Nguigmi",
    "Ayorou",
    "Kollo",
];
